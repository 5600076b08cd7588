//! Concrete flows of the World Feed Program app.

use flow_spec::{
    Bound, Completion, Flow, FlowBuilder, FlowError, MessageTemplate, Step, Validator,
};

pub const START: &str = "states:start";
pub const REGISTER: &str = "states:register";
pub const REPORT: &str = "states:report";
pub const END: &str = "states:end";
/// Menu shown when a session starts while the user is mid-flow.
pub const RESUME: &str = "states:resume";

pub const REGISTRATION_PREFIX: &str = "states:register:";
pub const REPORT_PREFIX: &str = "states:report:";

pub const WELCOME_TEXT: &str = "Welcome to the World Feed Program.";
pub const RESUME_TEXT: &str = "You have an unfinished session.";
pub const BYE_TEXT: &str = "Bye!";

/// Upper bound for any quantity of goods, in kilograms.
const MAX_GOODS_KG: i32 = 20000;
const MAX_PUPILS: i32 = 10000;

/// Registration: school identity plus opening stock balances.
pub fn registration_flow() -> Result<Flow, FlowError> {
    let mut builder = FlowBuilder::new(REGISTRATION_PREFIX);
    builder.register("school_id", Step::question("School ID:", Validator::free_text()))?;
    builder.register("emis", Step::question("EMIS:", Validator::integer()))?;
    for (suffix, question) in [
        ("cereal:opening", "Cereal opening (kg):"),
        ("pulses:opening", "Pulses opening (kg):"),
        ("oil:opening", "Oil opening (kg):"),
    ] {
        builder.register(suffix, goods_question(question))?;
    }
    builder.register(
        "end",
        Step::terminal_with(
            "Thanks for registering!",
            Completion {
                messages: vec![opening_balance_message()],
                mark_registered: true,
            },
        ),
    )?;
    builder.build()
}

/// Monthly school feeding report.
pub fn report_flow() -> Result<Flow, FlowError> {
    let mut builder = FlowBuilder::new(REPORT_PREFIX);
    builder.register("school_id", Step::question("School ID:", Validator::free_text()))?;
    builder.register(
        "days_in_session",
        Step::question(
            "Number of school days in session:",
            Validator::integer_in_range(1, 31),
        ),
    )?;
    builder.register(
        "days_of_feeding",
        Step::question(
            "Number of days food served:",
            Validator::integer_in_range(0, "days_in_session"),
        ),
    )?;

    builder.register(
        "enrollment_male",
        Step::question("Male enrollment:", Validator::integer_in_range(0, MAX_PUPILS)),
    )?;
    builder.register(
        "enrollment_female",
        Step::question("Female enrollment:", Validator::integer_in_range(0, MAX_PUPILS)),
    )?;
    builder.register(
        "enrollment_total",
        Step::total(
            "Total enrollment: {{total}}",
            ["enrollment_male", "enrollment_female"],
        ),
    )?;

    builder.register(
        "attendance_male",
        Step::question(
            "Male attendance (highest):",
            Validator::integer_in_range(0, "enrollment_male"),
        ),
    )?;
    builder.register(
        "attendance_female",
        Step::question(
            "Female attendance (highest):",
            Validator::integer_in_range(0, "enrollment_female"),
        ),
    )?;
    builder.register(
        "attendance_total",
        Step::total(
            "Total attendance: {{total}}",
            ["attendance_male", "attendance_female"],
        ),
    )?;

    builder.register(
        "beneficiaries_male",
        Step::question(
            "Male beneficiaries (highest):",
            Validator::integer_in_range(0, "attendance_male"),
        ),
    )?;
    builder.register(
        "beneficiaries_female",
        Step::question(
            "Female beneficiaries (highest):",
            Validator::integer_in_range(0, "attendance_female"),
        ),
    )?;
    builder.register(
        "beneficiaries_total",
        Step::total(
            "Total beneficiaries: {{total}}",
            ["beneficiaries_male", "beneficiaries_female"],
        ),
    )?;

    for (suffix, reason) in [
        ("not_fed:lack_of_food", "Lack of food"),
        ("not_fed:lack_of_firewood", "Lack of firewood"),
        ("not_fed:lack_of_water", "Lack of water"),
        ("not_fed:cooks_absent", "Cooks absent"),
        ("not_fed:pupils_dislike_food", "Pupils dislike food"),
        ("not_fed:other", "Other"),
    ] {
        builder.register(
            suffix,
            Step::question(
                format!("Number of days pupils not fed for - {reason}:"),
                Validator::integer_in_range(0, days_without_feeding()),
            ),
        )?;
    }

    for (good, label) in [("cereal", "Cereal"), ("pulses", "Pulses"), ("oil", "Oil")] {
        for (movement, verb) in [("received", "received"), ("used", "used"), ("losses", "lost")] {
            builder.register(
                &format!("{good}:{movement}"),
                goods_question(format!("{label} {verb} (kg):")),
            )?;
        }
    }

    builder.register(
        "end",
        Step::terminal_with(
            "Thanks for the report!",
            Completion {
                messages: vec![monthly_report_message()],
                mark_registered: false,
            },
        ),
    )?;
    builder.build()
}

/// `days_in_session - days_of_feeding`, once both are answered.
pub fn days_without_feeding() -> Bound {
    Bound::derived(|view| {
        Some(view.number("days_in_session")? - view.number("days_of_feeding")?)
    })
}

fn goods_question(question: impl Into<String>) -> Step {
    Step::question(question, Validator::decimal_in_range(0, MAX_GOODS_KG))
}

/// `set <school> emis<emis> cer-o.. pul-o.. oil-o..`
pub fn opening_balance_message() -> MessageTemplate {
    MessageTemplate::new(
        "opening_balance",
        [
            ("set ", "school_id"),
            ("emis", "emis"),
            ("cer-o", "cereal:opening"),
            ("pul-o", "pulses:opening"),
            ("oil-o", "oil:opening"),
        ],
    )
}

/// `hgsfussd <school> sch.. fed.. ...` carrying the whole monthly report.
pub fn monthly_report_message() -> MessageTemplate {
    MessageTemplate::new(
        "monthly_report",
        [
            ("hgsfussd ", "school_id"),
            ("sch", "days_in_session"),
            ("fed", "days_of_feeding"),
            ("enr-m", "enrollment_male"),
            ("enr-f", "enrollment_female"),
            ("att-m", "attendance_male"),
            ("att-f", "attendance_female"),
            ("ben-m", "beneficiaries_male"),
            ("ben-f", "beneficiaries_female"),
            ("nofed-a", "not_fed:lack_of_food"),
            ("nofed-b", "not_fed:lack_of_firewood"),
            ("nofed-c", "not_fed:lack_of_water"),
            ("nofed-d", "not_fed:cooks_absent"),
            ("nofed-e", "not_fed:pupils_dislike_food"),
            ("nofed-f", "not_fed:other"),
            ("cer-r", "cereal:received"),
            ("cer-u", "cereal:used"),
            ("cer-l", "cereal:losses"),
            ("pul-r", "pulses:received"),
            ("pul-u", "pulses:used"),
            ("pul-l", "pulses:losses"),
            ("oil-r", "oil:received"),
            ("oil-u", "oil:used"),
            ("oil-l", "oil:losses"),
        ],
    )
}
