use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Threshold expressions keyed by metric name, in the engine's
/// `{ "metric": ["expr", ...] }` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(BTreeMap<String, Vec<String>>);

impl Thresholds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Thresholds::insert`].
    #[must_use]
    pub fn with<I, S>(mut self, metric: &str, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(metric, expressions);
        self
    }

    /// Sets the expressions for `metric`, replacing any previous ones.
    pub fn insert<I, S>(&mut self, metric: &str, expressions: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.insert(
            metric.to_string(),
            expressions.into_iter().map(Into::into).collect(),
        );
    }

    /// Overlays `other` on top of `self`: per metric, `other` wins.
    pub fn merge(&mut self, other: &Thresholds) {
        for (metric, exprs) in &other.0 {
            self.0.insert(metric.clone(), exprs.clone());
        }
    }

    #[must_use]
    pub fn merged(mut self, other: &Thresholds) -> Self {
        self.merge(other);
        self
    }

    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&[String]> {
        self.0.get(metric).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks every expression against the threshold grammar.
    pub fn validate(&self) -> Result<()> {
        for (metric, exprs) in &self.0 {
            if exprs.is_empty() {
                return Err(Error::InvalidThresholdExpr {
                    metric: metric.clone(),
                    error: "empty list".to_string(),
                });
            }
            for expr in exprs {
                parse_threshold_expr(expr).map_err(|error| Error::InvalidThresholdExpr {
                    metric: metric.clone(),
                    error,
                })?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Eq,
}

impl ThresholdOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Eq => "==",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdAgg {
    Avg,
    Min,
    Med,
    Max,
    Count,
    Rate,
    P(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdExpr {
    pub agg: ThresholdAgg,
    pub op: ThresholdOp,
    pub value: f64,
}

impl fmt::Display for ThresholdExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.agg {
            ThresholdAgg::Avg => f.write_str("avg")?,
            ThresholdAgg::Min => f.write_str("min")?,
            ThresholdAgg::Med => f.write_str("med")?,
            ThresholdAgg::Max => f.write_str("max")?,
            ThresholdAgg::Count => f.write_str("count")?,
            ThresholdAgg::Rate => f.write_str("rate")?,
            ThresholdAgg::P(p) => write!(f, "p({})", format_number(p))?,
        }
        write!(f, "{}{}", self.op.as_str(), format_number(self.value))
    }
}

pub fn parse_threshold_expr(raw: &str) -> std::result::Result<ThresholdExpr, String> {
    let s: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return Err("empty threshold".to_string());
    }

    // Two-char operators first so `<=` is not read as `<`.
    let ops = [
        ("<=", ThresholdOp::Lte),
        (">=", ThresholdOp::Gte),
        ("==", ThresholdOp::Eq),
        ("<", ThresholdOp::Lt),
        (">", ThresholdOp::Gt),
    ];
    let (op_pos, op_len, op) = ops
        .iter()
        .find_map(|(tok, op)| s.find(tok).map(|pos| (pos, tok.len(), *op)))
        .ok_or_else(|| format!("invalid threshold (missing operator): {raw}"))?;

    let (left, right_with_op) = s.split_at(op_pos);
    let right = &right_with_op[op_len..];
    if left.is_empty() || right.is_empty() {
        return Err(format!("invalid threshold: {raw}"));
    }

    let agg = if left.eq_ignore_ascii_case("avg") {
        ThresholdAgg::Avg
    } else if left.eq_ignore_ascii_case("min") {
        ThresholdAgg::Min
    } else if left.eq_ignore_ascii_case("med") {
        ThresholdAgg::Med
    } else if left.eq_ignore_ascii_case("max") {
        ThresholdAgg::Max
    } else if left.eq_ignore_ascii_case("count") {
        ThresholdAgg::Count
    } else if left.eq_ignore_ascii_case("rate") {
        ThresholdAgg::Rate
    } else if let Some(inner) = left.strip_prefix("p(").and_then(|v| v.strip_suffix(')')) {
        let p: f64 = inner
            .parse()
            .map_err(|_| format!("invalid percentile in threshold: {raw}"))?;
        if !(p > 0.0 && p <= 100.0) {
            return Err(format!("percentile out of range in threshold: {raw}"));
        }
        ThresholdAgg::P(p)
    } else {
        return Err(format!("unknown aggregation `{left}` in threshold: {raw}"));
    };

    let value: f64 = right
        .parse()
        .map_err(|_| format!("invalid numeric value in threshold: {raw}"))?;
    if !value.is_finite() {
        return Err(format!("invalid numeric value in threshold: {raw}"));
    }

    Ok(ThresholdExpr { agg, op, value })
}

/// Shortest decimal form: integers without a fraction, others rounded to
/// four places with trailing zeros removed.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        return format!("{v:.0}");
    }
    let s = format!("{v:.4}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_threshold_expr_trims_whitespace() {
        let expr = parse_threshold_expr("  avg  <=  123  ").unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(expr.agg, ThresholdAgg::Avg));
        assert!(matches!(expr.op, ThresholdOp::Lte));
        assert_eq!(expr.value, 123.0);
    }

    #[test]
    fn parse_threshold_expr_rejects_out_of_range_percentiles() {
        let err = match parse_threshold_expr("p(101)<1") {
            Ok(_) => panic!("expected error"),
            Err(e) => e,
        };
        assert!(err.contains("out of range"));
    }

    #[test]
    fn parse_threshold_expr_accepts_fractional_percentiles_and_med() {
        let expr = parse_threshold_expr("p(99.9)<1500").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(expr.agg, ThresholdAgg::P(99.9));
        let expr = parse_threshold_expr("med<400").unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(expr.agg, ThresholdAgg::Med);
    }

    #[test]
    fn threshold_expr_displays_canonical_form() {
        for raw in ["p(95)<3000", "rate<0.1", "count>=30", "p(99.9)==2", "rate>0.7"] {
            let expr = parse_threshold_expr(raw).unwrap_or_else(|e| panic!("{e}"));
            assert_eq!(expr.to_string(), raw);
        }
    }

    #[test]
    fn merge_overrides_per_metric() {
        let base = Thresholds::new()
            .with("http_req_duration", ["p(95)<3000", "p(99)<5000"])
            .with("checks", ["rate>0.7"]);
        let custom = Thresholds::new().with("http_req_duration", ["p(95)<800"]);

        let merged = base.merged(&custom);
        assert_eq!(
            merged.get("http_req_duration"),
            Some(&["p(95)<800".to_string()][..])
        );
        assert_eq!(merged.get("checks"), Some(&["rate>0.7".to_string()][..]));
    }

    #[test]
    fn validate_reports_metric_of_bad_expression() {
        let t = Thresholds::new()
            .with("ok", ["rate<0.1"])
            .with("bad", ["sometimes"]);
        match t.validate() {
            Err(Error::InvalidThresholdExpr { metric, .. }) => assert_eq!(metric, "bad"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn format_number_trims() {
        assert_eq!(format_number(3000.0), "3000");
        assert_eq!(format_number(0.7), "0.7");
        assert_eq!(format_number(1.0 - 0.3), "0.7");
        assert_eq!(format_number(0.125), "0.125");
    }
}
