use flow_spec::{
    Answer, AnswerStore, Bound, Flow, FlowBuilder, Rejection, Step, StepName, Validator, validate,
};

const PREFIX: &str = "states:report:";

fn days_without_feeding() -> Bound {
    Bound::derived(|view| Some(view.number("days_in_session")? - view.number("days_of_feeding")?))
}

fn make_feeding_flow() -> Flow {
    let mut builder = FlowBuilder::new(PREFIX);
    builder
        .register(
            "days_in_session",
            Step::question(
                "Number of school days in session:",
                Validator::integer_in_range(1, 31),
            ),
        )
        .expect("days_in_session");
    builder
        .register(
            "days_of_feeding",
            Step::question(
                "Number of days food served:",
                Validator::integer_in_range(0, "days_in_session"),
            ),
        )
        .expect("days_of_feeding");
    builder
        .register(
            "not_fed:lack_of_food",
            Step::question(
                "Number of days pupils not fed for - Lack of food:",
                Validator::integer_in_range(0, days_without_feeding()),
            ),
        )
        .expect("not_fed");
    builder
        .register(
            "cereal:received",
            Step::question(
                "Cereal received (kg):",
                Validator::decimal_in_range(0, 20000),
            ),
        )
        .expect("cereal");
    builder.build().expect("build")
}

fn answers(pairs: &[(&str, Answer)]) -> AnswerStore {
    pairs
        .iter()
        .map(|(suffix, answer)| (StepName::new(PREFIX, suffix), answer.clone()))
        .collect()
}

fn check(validator: &Validator, store: &AnswerStore, raw: &str) -> Result<Answer, Rejection> {
    validator.validate(raw, &store.view(PREFIX))
}

#[test]
fn integer_range_accepts_bounds_and_rejects_neighbours() {
    let store = AnswerStore::new();
    let validator = Validator::integer_in_range(1, 31);
    assert_eq!(check(&validator, &store, "1"), Ok(Answer::Integer(1)));
    assert_eq!(check(&validator, &store, "31"), Ok(Answer::Integer(31)));
    assert_eq!(check(&validator, &store, "12"), Ok(Answer::Integer(12)));
    let out_of_range = Err(Rejection::OutOfRange {
        min: "1".into(),
        max: "31".into(),
    });
    assert_eq!(check(&validator, &store, "0"), out_of_range);
    assert_eq!(check(&validator, &store, "32"), out_of_range);
    assert_eq!(
        check(&validator, &store, "FOO"),
        Err(Rejection::NotWholeNumber)
    );
    assert_eq!(
        check(&validator, &store, "1.1"),
        Err(Rejection::NotWholeNumber)
    );
}

#[test]
fn range_message_names_resolved_bounds() {
    let store = answers(&[("days_in_session", Answer::Integer(5))]);
    let rejection = check(&Validator::integer_in_range(0, "days_in_session"), &store, "6")
        .unwrap_err();
    assert_eq!(rejection.to_string(), "Number must be between 0 and 5.");
}

#[test]
fn decimal_range_accepts_fractions() {
    let store = AnswerStore::new();
    let validator = Validator::decimal_in_range(0, 20000);
    assert_eq!(check(&validator, &store, "0"), Ok(Answer::Decimal(0.0)));
    assert_eq!(check(&validator, &store, "20000"), Ok(Answer::Decimal(20000.0)));
    assert_eq!(check(&validator, &store, "1.1"), Ok(Answer::Decimal(1.1)));
    assert_eq!(
        check(&validator, &store, "20001"),
        Err(Rejection::OutOfRange {
            min: "0".into(),
            max: "20000".into()
        })
    );
    assert_eq!(check(&validator, &store, "1."), Err(Rejection::NotNumber));
    assert_eq!(check(&validator, &store, "abc"), Err(Rejection::NotNumber));
}

#[test]
fn derived_bound_limits_not_fed_days() {
    let store = answers(&[
        ("days_in_session", Answer::Integer(30)),
        ("days_of_feeding", Answer::Integer(20)),
    ]);
    let validator = Validator::integer_in_range(0, days_without_feeding());
    for accepted in 0..=10 {
        assert_eq!(
            check(&validator, &store, &accepted.to_string()),
            Ok(Answer::Integer(accepted))
        );
    }
    assert_eq!(
        check(&validator, &store, "11"),
        Err(Rejection::OutOfRange {
            min: "0".into(),
            max: "10".into()
        })
    );
}

#[test]
fn derived_bound_over_unanswered_steps_is_a_rejection() {
    let store = answers(&[("days_in_session", Answer::Integer(30))]);
    let result = check(&Validator::integer_in_range(0, days_without_feeding()), &store, "1");
    let rejection = result.unwrap_err();
    assert_eq!(rejection.code(), "unresolved_bound");
}

#[test]
fn whole_set_validation_passes_for_consistent_answers() {
    let flow = make_feeding_flow();
    let store = answers(&[
        ("days_in_session", Answer::Integer(30)),
        ("days_of_feeding", Answer::Integer(20)),
        ("not_fed:lack_of_food", Answer::Integer(4)),
        ("cereal:received", Answer::Decimal(100.0)),
    ]);
    let result = validate(&flow, &store);
    assert!(result.valid, "unexpected result: {result:?}");
}

#[test]
fn whole_set_validation_reports_each_problem() {
    let flow = make_feeding_flow();
    let mut store = answers(&[
        ("days_in_session", Answer::Integer(30)),
        ("days_of_feeding", Answer::Integer(31)),
        ("enrollment_total", Answer::Integer(13)),
    ]);
    store.insert("states:register:school_id".into(), "ignored".into());

    let result = validate(&flow, &store);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].step.as_str(), "states:report:days_of_feeding");
    assert_eq!(result.errors[0].code, "out_of_range");
    assert_eq!(
        result.missing_required,
        vec![
            StepName::from("states:report:not_fed:lack_of_food"),
            StepName::from("states:report:cereal:received"),
        ]
    );
    assert_eq!(result.unknown_fields, vec!["states:report:enrollment_total"]);
}
