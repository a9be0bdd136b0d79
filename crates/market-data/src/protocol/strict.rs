//! Float serializers that refuse NaN and Infinity.
//!
//! `serde_json` quietly writes non-finite floats as `null`. Response fields
//! that carry raw `f64`s use these instead so a bad value surfaces as an
//! encoding error.

use serde::ser::Error;
use serde::Serializer;

pub fn finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else {
        Err(S::Error::custom(format!(
            "non-finite float {value} is not valid JSON"
        )))
    }
}

pub fn finite_option<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => finite(v, serializer),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        #[serde(serialize_with = "super::finite")]
        close: f64,
        #[serde(serialize_with = "super::finite_option")]
        volume: Option<f64>,
    }

    #[test]
    fn test_finite_values_serialize() {
        let row = Row {
            close: 10.5,
            volume: None,
        };
        assert_eq!(
            serde_json::to_string(&row).unwrap(),
            r#"{"close":10.5,"volume":null}"#
        );
    }

    #[test]
    fn test_infinity_is_rejected() {
        let row = Row {
            close: 1.0,
            volume: Some(f64::INFINITY),
        };
        let err = serde_json::to_string(&row).unwrap_err();
        assert!(err.to_string().contains("non-finite float inf"));
    }
}
