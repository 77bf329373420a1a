//! Low-cardinality route names for spans and metrics.

use uuid::Uuid;

/// Collapse identifiers so every request to the same endpoint shares a route.
///
/// UUID segments become `{uuid}`; numeric segments are cell coordinates and
/// become `{row}` then `{col}`.
pub(super) fn route_template(path: &str) -> String {
    let mut coordinates = ["{row}", "{col}"].into_iter();

    let segments = path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| {
            if Uuid::parse_str(segment).is_ok() {
                "{uuid}"
            } else if !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()) {
                coordinates.next().unwrap_or("{n}")
            } else {
                segment
            }
        })
        .collect::<Vec<_>>();

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_collapsed() {
        assert_eq!(
            route_template(
                "/api/v1/spreadsheets/0190c1a4-6f6b-7c3e-9f58-3a7d2b1e4c90/sheets/0190c1a4-6f6b-7c3e-9f58-3a7d2b1e4c91/cells"
            ),
            "/api/v1/spreadsheets/{uuid}/sheets/{uuid}/cells"
        );
    }

    #[test]
    fn cell_coordinates_are_collapsed() {
        assert_eq!(
            route_template("/api/v1/spreadsheets/0190c1a4-6f6b-7c3e-9f58-3a7d2b1e4c90/sheets/0190c1a4-6f6b-7c3e-9f58-3a7d2b1e4c91/cells/12/3"),
            "/api/v1/spreadsheets/{uuid}/sheets/{uuid}/cells/{row}/{col}"
        );
    }

    #[test]
    fn root_and_static_paths_are_unchanged() {
        assert_eq!(route_template("/"), "/");
        assert_eq!(route_template("/api/v1/audit-logs"), "/api/v1/audit-logs");
    }
}
