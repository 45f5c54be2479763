use serde_json::Value;

use crate::SwaggerClientError;
use crate::client::operation::ParameterLocation;

/// How array values of a parameter are serialized.
///
/// Swagger 2.0 calls it `collectionFormat`; OpenAPI 3 derives it from `style`
/// and `explode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamStyle {
    /// Comma separated: `a,b`
    #[default]
    Csv,
    /// Space separated: `a b`
    Ssv,
    /// Tab separated
    Tsv,
    /// Pipe separated: `a|b`
    Pipes,
    /// Repeated parameter: `tag=a&tag=b`
    Multi,
}

impl ParamStyle {
    pub(crate) fn from_collection_format(format: Option<&str>) -> Self {
        match format {
            Some("ssv") => Self::Ssv,
            Some("tsv") => Self::Tsv,
            Some("pipes") => Self::Pipes,
            Some("multi") => Self::Multi,
            _ => Self::Csv,
        }
    }

    pub(crate) fn from_openapi(location: ParameterLocation, parameter: &Value) -> Self {
        let style = parameter.get("style").and_then(Value::as_str).unwrap_or(
            match location {
                ParameterLocation::Query | ParameterLocation::Cookie | ParameterLocation::FormData => "form",
                _ => "simple",
            },
        );
        let explode = parameter
            .get("explode")
            .and_then(Value::as_bool)
            .unwrap_or(style == "form");

        match style {
            "form" if explode => Self::Multi,
            "spaceDelimited" => Self::Ssv,
            "pipeDelimited" => Self::Pipes,
            _ => Self::Csv,
        }
    }

    fn delimiter(self) -> &'static str {
        match self {
            Self::Csv | Self::Multi => ",",
            Self::Ssv => " ",
            Self::Tsv => "\t",
            Self::Pipes => "|",
        }
    }
}

fn scalar_to_string(name: &str, value: &Value) -> Result<String, SwaggerClientError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(SwaggerClientError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "nested complex values not supported in parameters".to_string(),
            value: value.clone(),
        }),
    }
}

/// Serializes a value as a single string, joining arrays with the style delimiter.
pub(crate) fn to_string_value(name: &str, value: &Value, style: ParamStyle) -> Result<String, SwaggerClientError> {
    match value {
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| scalar_to_string(name, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items.join(style.delimiter()))
        }
        Value::Object(_) => Err(SwaggerClientError::UnsupportedParameterValue {
            name: name.to_string(),
            message: "object values not supported in parameters".to_string(),
            value: value.clone(),
        }),
        _ => scalar_to_string(name, value),
    }
}

/// Serializes a value for a query string or a form: one entry per item for `multi`.
pub(crate) fn to_query_values(name: &str, value: &Value, style: ParamStyle) -> Result<Vec<String>, SwaggerClientError> {
    match value {
        Value::Array(items) if style == ParamStyle::Multi => items
            .iter()
            .map(|item| scalar_to_string(name, item))
            .collect(),
        _ => to_string_value(name, value, style).map(|value| vec![value]),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case::csv(None, ParamStyle::Csv)]
    #[case::multi(Some("multi"), ParamStyle::Multi)]
    #[case::pipes(Some("pipes"), ParamStyle::Pipes)]
    #[case::unknown(Some("weird"), ParamStyle::Csv)]
    fn should_read_collection_format(#[case] format: Option<&str>, #[case] expected: ParamStyle) {
        assert_eq!(ParamStyle::from_collection_format(format), expected);
    }

    #[rstest]
    #[case::query_default(ParameterLocation::Query, json!({}), ParamStyle::Multi)]
    #[case::query_not_exploded(ParameterLocation::Query, json!({"explode": false}), ParamStyle::Csv)]
    #[case::path_default(ParameterLocation::Path, json!({}), ParamStyle::Csv)]
    #[case::space(ParameterLocation::Query, json!({"style": "spaceDelimited"}), ParamStyle::Ssv)]
    #[case::pipe(ParameterLocation::Query, json!({"style": "pipeDelimited", "explode": false}), ParamStyle::Pipes)]
    fn should_read_openapi_style(
        #[case] location: ParameterLocation,
        #[case] parameter: Value,
        #[case] expected: ParamStyle,
    ) {
        assert_eq!(ParamStyle::from_openapi(location, &parameter), expected);
    }

    #[test]
    fn should_join_arrays() {
        let value = json!(["available", "sold", 42]);

        assert_eq!(to_string_value("status", &value, ParamStyle::Csv).expect("csv"), "available,sold,42");
        assert_eq!(to_string_value("status", &value, ParamStyle::Pipes).expect("pipes"), "available|sold|42");
        assert_eq!(
            to_query_values("status", &value, ParamStyle::Multi).expect("multi"),
            vec!["available", "sold", "42"]
        );
    }

    #[test]
    fn should_reject_objects() {
        let error = to_string_value("filter", &json!({"a": 1}), ParamStyle::Csv).expect_err("object");

        insta::assert_snapshot!(error, @r#"Unsupported value for parameter 'filter': object values not supported in parameters. Got: {"a":1}"#);
    }
}
