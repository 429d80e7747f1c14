//! Prometheus text exposition format.
//!
//! Renders the per-component status into gauges labelled by environment,
//! system and component.

use crate::handlers::ComponentStatus;

/// Render component statuses into Prometheus text format.
pub fn render_prometheus(statuses: &[ComponentStatus]) -> String {
    let mut out = String::new();

    out.push_str("# HELP rollcall_alive_units Running units with an unexpired checkin.\n");
    out.push_str("# TYPE rollcall_alive_units gauge\n");
    for s in statuses {
        out.push_str(&format!("rollcall_alive_units{{{}}} {}\n", labels(s), s.alive));
    }

    out.push_str("# HELP rollcall_unit_floor Lowest unit count in the retained history.\n");
    out.push_str("# TYPE rollcall_unit_floor gauge\n");
    for s in statuses {
        out.push_str(&format!("rollcall_unit_floor{{{}}} {}\n", labels(s), s.floor));
    }

    out
}

fn labels(s: &ComponentStatus) -> String {
    format!(
        "environment=\"{}\",system=\"{}\",component=\"{}\"",
        escape(&s.environment),
        escape(&s.system),
        escape(&s.component)
    )
}

/// Escape a label value per the exposition format.
fn escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
