//! Line protocol rendering
//!
//! Turns collected measurements into InfluxDB line protocol, one line per
//! measurement, no timestamps. Tag and field order comes from the sorted maps
//! inside [`Measurement`], so output is deterministic for identical input.

use crate::emitter::{FieldValue, Measurement};

/// Escape a measurement name
fn escape_measurement(name: &str) -> String {
    name.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape a tag key, tag value, or field key
fn escape_key(key: &str) -> String {
    key.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Render a field value with its type marker
fn render_field_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Integer(v) => format!("{v}i"),
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::String(v) => {
            format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
        }
        FieldValue::Boolean(v) => format!("{v}"),
    }
}

/// Render one measurement as a single protocol line
///
/// Measurements without fields produce `None`; the protocol has no way to
/// express them.
pub fn format_measurement(measurement: &Measurement) -> Option<String> {
    if measurement.fields.is_empty() {
        return None;
    }

    let mut line = escape_measurement(&measurement.name);

    for (key, value) in &measurement.tags {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');

    let fields: Vec<String> = measurement
        .fields
        .iter()
        .map(|(key, value)| format!("{}={}", escape_key(key), render_field_value(value)))
        .collect();
    line.push_str(&fields.join(","));

    Some(line)
}

/// Render a batch of measurements, one line each, trailing newline
pub fn format_measurements(measurements: &[Measurement]) -> String {
    let mut output = String::new();
    for measurement in measurements {
        if let Some(line) = format_measurement(measurement) {
            output.push_str(&line);
            output.push('\n');
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_line() {
        let m = Measurement::new("openstack_hypervisor")
            .with_tag("name", "hv1.example.com")
            .with_field("vcpus", 8_i64)
            .with_field("memory_mb", 15872_i64);

        assert_eq!(
            format_measurement(&m).as_deref(),
            Some("openstack_hypervisor,name=hv1.example.com memory_mb=15872i,vcpus=8i")
        );
    }

    #[test]
    fn test_tagless_line() {
        let m = Measurement::new("openstack_identity").with_field("projects", 3_i64);
        assert_eq!(
            format_measurement(&m).as_deref(),
            Some("openstack_identity projects=3i")
        );
    }

    #[test]
    fn test_string_field_quoted() {
        let m = Measurement::new("openstack_server")
            .with_tag("name", "vm-1")
            .with_field("status", "shutoff");
        assert_eq!(
            format_measurement(&m).as_deref(),
            Some("openstack_server,name=vm-1 status=\"shutoff\"")
        );
    }

    #[test]
    fn test_escaping() {
        let m = Measurement::new("my metric")
            .with_tag("host name", "a=b,c")
            .with_field("note", "say \"hi\"");
        assert_eq!(
            format_measurement(&m).as_deref(),
            Some("my\\ metric,host\\ name=a\\=b\\,c note=\"say \\\"hi\\\"\"")
        );
    }

    #[test]
    fn test_fieldless_measurement_dropped() {
        let m = Measurement::new("empty").with_tag("name", "x");
        assert_eq!(format_measurement(&m), None);
    }

    #[test]
    fn test_batch_with_trailing_newline() {
        let measurements = vec![
            Measurement::new("a").with_field("x", 1_i64),
            Measurement::new("b").with_field("y", 2.5_f64),
        ];
        assert_eq!(format_measurements(&measurements), "a x=1i\nb y=2.5\n");
    }

    #[test]
    fn test_deterministic_output() {
        let m = Measurement::new("m")
            .with_tag("b", "2")
            .with_tag("a", "1")
            .with_field("z", 1_i64)
            .with_field("a", 2_i64);
        assert_eq!(
            format_measurement(&m).as_deref(),
            Some("m,a=1,b=2 a=2i,z=1i")
        );
    }
}
