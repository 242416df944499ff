//! PromQL expression builders for the solar meter metrics.

use crate::config::MetricsConfig;

/// Builds selectors and functions over the configured generation and power
/// metrics, optionally scoped to one site.
#[derive(Debug, Clone)]
pub struct Selectors<'a> {
    metrics: &'a MetricsConfig,
}

impl<'a> Selectors<'a> {
    pub fn new(metrics: &'a MetricsConfig) -> Self {
        Self { metrics }
    }

    /// `total_import{purpose="solar"}`, or with a `site` matcher.
    pub fn generation(&self, site: Option<&str>) -> String {
        self.selector(&self.metrics.generation, site)
    }

    /// `total_act_power{purpose="solar"}`, or with a `site` matcher.
    pub fn power(&self, site: Option<&str>) -> String {
        self.selector(&self.metrics.power, site)
    }

    fn selector(&self, metric: &str, site: Option<&str>) -> String {
        match site {
            Some(site) => format!(
                "{}{{purpose=\"{}\", site=\"{}\"}}",
                metric,
                escape_label(&self.metrics.purpose),
                escape_label(site)
            ),
            None => format!(
                "{}{{purpose=\"{}\"}}",
                metric,
                escape_label(&self.metrics.purpose)
            ),
        }
    }
}

pub fn delta(selector: &str, window: &str) -> String {
    format!("delta({}[{}])", selector, window)
}

pub fn max_over_time(selector: &str, window: &str) -> String {
    format!("max_over_time({}[{}])", selector, window)
}

pub fn last_over_time(selector: &str, window: &str) -> String {
    format!("last_over_time({}[{}])", selector, window)
}

pub fn avg_over_time(selector: &str, window: &str) -> String {
    format!("avg_over_time({}[{}])", selector, window)
}

/// `expr[range:step]` subquery, evaluated as an instant query returning a matrix.
pub fn subquery(expr: &str, range: &str, step: &str) -> String {
    format!("{}[{}:{}]", expr, range, step)
}

pub fn sum(expr: &str) -> String {
    format!("sum({})", expr)
}

/// Escape a value for use inside a double-quoted PromQL label matcher.
pub fn escape_label(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fleet_selectors() {
        let metrics = MetricsConfig::default();
        let sel = Selectors::new(&metrics);

        assert_eq!(sel.generation(None), r#"total_import{purpose="solar"}"#);
        assert_eq!(sel.power(None), r#"total_act_power{purpose="solar"}"#);
    }

    #[test]
    fn test_site_selectors_escape_values() {
        let metrics = MetricsConfig::default();
        let sel = Selectors::new(&metrics);

        assert_eq!(
            sel.power(Some("North Barn")),
            r#"total_act_power{purpose="solar", site="North Barn"}"#
        );
        assert_eq!(
            sel.generation(Some(r#"a"b\c"#)),
            r#"total_import{purpose="solar", site="a\"b\\c"}"#
        );
    }

    #[test]
    fn test_functions() {
        assert_eq!(delta("m", "7d"), "delta(m[7d])");
        assert_eq!(max_over_time("m", "1y"), "max_over_time(m[1y])");
        assert_eq!(
            sum(&last_over_time("m", "1y")),
            "sum(last_over_time(m[1y]))"
        );
        assert_eq!(
            subquery(&avg_over_time("m", "15m"), "7d", "15m"),
            "avg_over_time(m[15m])[7d:15m]"
        );
    }
}
