use flow_spec::{
    Completion, Flow, FlowBuilder, FlowError, MessageTemplate, Step, StepKind, Validator,
};

fn make_school_flow() -> Flow {
    let mut builder = FlowBuilder::new("states:report:");
    builder
        .register("school_id", Step::question("School ID:", Validator::free_text()))
        .expect("school_id");
    builder
        .register(
            "enrollment_male",
            Step::question("Male enrollment:", Validator::integer_in_range(0, 10000)),
        )
        .expect("enrollment_male");
    builder
        .register(
            "enrollment_female",
            Step::question("Female enrollment:", Validator::integer_in_range(0, 10000)),
        )
        .expect("enrollment_female");
    builder
        .register(
            "enrollment_total",
            Step::total(
                "Total enrollment: {{total}}",
                ["enrollment_male", "enrollment_female"],
            ),
        )
        .expect("enrollment_total");
    builder
        .register("end", Step::terminal("Thanks for the report!"))
        .expect("end");
    builder.build().expect("build flow")
}

#[test]
fn successors_reach_terminal_in_len_minus_one_hops() {
    let flow = make_school_flow();
    let mut current = flow.first().clone();
    let mut hops = 0;
    while let Some(next) = flow.next(current.as_str()) {
        current = next.clone();
        hops += 1;
    }
    assert_eq!(hops, flow.len() - 1);
    assert_eq!(current.as_str(), "states:report:end");
    assert_eq!(
        flow.step(current.as_str()).map(Step::kind),
        Some(StepKind::Terminal)
    );
    assert_eq!(flow.next("states:report:end"), None);
}

#[test]
fn order_follows_registration_not_alphabet() {
    let flow = make_school_flow();
    let order: Vec<&str> = flow.steps().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "states:report:school_id",
            "states:report:enrollment_male",
            "states:report:enrollment_female",
            "states:report:enrollment_total",
            "states:report:end",
        ]
    );
    assert_eq!(flow.first().as_str(), "states:report:school_id");
}

#[test]
fn duplicate_suffix_is_rejected() {
    let mut builder = FlowBuilder::new("states:register:");
    builder
        .register("school_id", Step::question("School ID:", Validator::free_text()))
        .expect("first registration");
    let err = builder
        .register("school_id", Step::question("Again:", Validator::free_text()))
        .unwrap_err();
    assert_eq!(
        err,
        FlowError::DuplicateSuffix("states:register:school_id".into())
    );
}

#[test]
fn empty_flow_is_a_configuration_error() {
    let err = FlowBuilder::new("states:empty:").build().unwrap_err();
    assert_eq!(err, FlowError::Empty("states:empty:".into()));
}

#[test]
fn terminal_must_be_last() {
    let mut builder = FlowBuilder::new("p:");
    builder.register("end", Step::terminal("Bye")).expect("end");
    builder
        .register("late", Step::question("Late?", Validator::integer()))
        .expect("late");
    assert_eq!(
        builder.build().unwrap_err(),
        FlowError::TerminalNotLast("p:end".into())
    );
}

#[test]
fn bound_reference_must_precede_its_use() {
    let mut builder = FlowBuilder::new("p:");
    builder
        .register(
            "days_of_feeding",
            Step::question("Fed:", Validator::integer_in_range(0, "days_in_session")),
        )
        .expect("days_of_feeding");
    builder
        .register(
            "days_in_session",
            Step::question("Days:", Validator::integer_in_range(1, 31)),
        )
        .expect("days_in_session");
    assert!(matches!(
        builder.build(),
        Err(FlowError::ForwardReference { reference, .. }) if reference == "days_in_session"
    ));
}

#[test]
fn total_sources_must_be_earlier_questions() {
    let mut builder = FlowBuilder::new("p:");
    builder
        .register("total", Step::total("Total: {{total}}", ["a", "b"]))
        .expect("total");
    assert!(matches!(
        builder.build(),
        Err(FlowError::UnknownTotalSource { key, .. }) if key == "a"
    ));
}

#[test]
fn completion_fields_must_be_questions() {
    let mut builder = FlowBuilder::new("p:");
    builder
        .register("school_id", Step::question("School ID:", Validator::free_text()))
        .expect("school_id");
    builder
        .register(
            "end",
            Step::terminal_with(
                "Thanks!",
                Completion {
                    messages: vec![MessageTemplate::new(
                        "broken",
                        [("set ", "school_id"), ("emis", "emis")],
                    )],
                    mark_registered: true,
                },
            ),
        )
        .expect("end");
    assert!(matches!(
        builder.build(),
        Err(FlowError::UnknownMessageField { key, .. }) if key == "emis"
    ));
}
