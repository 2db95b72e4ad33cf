//! Prometheus text exposition.

use prometheus::proto::MetricFamily;
use prometheus::{Encoder, TextEncoder};

/// Content type of [`encode`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Serialize families in the order given.
pub fn encode(families: &[MetricFamily]) -> prometheus::Result<Vec<u8>> {
    let mut buf = Vec::new();
    TextEncoder::new().encode(families, &mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use prometheus::core::Collector;
    use prometheus::{Gauge, Opts};

    use super::*;

    #[test]
    fn encodes_in_given_order() {
        let b = Gauge::with_opts(Opts::new("b_metric", "b help")).unwrap();
        let a = Gauge::with_opts(Opts::new("a_metric", "a help")).unwrap();
        b.set(2.0);
        a.set(1.0);

        let mut families = b.collect();
        families.extend(a.collect());
        let text = String::from_utf8(encode(&families).unwrap()).unwrap();

        let b_pos = text.find("b_metric 2").unwrap();
        let a_pos = text.find("a_metric 1").unwrap();
        assert!(b_pos < a_pos);
        assert!(text.contains("# HELP a_metric a help"));
        assert!(text.contains("# TYPE b_metric gauge"));
    }

    #[test]
    fn encodes_nothing_for_no_families() {
        assert!(encode(&[]).unwrap().is_empty());
    }
}
