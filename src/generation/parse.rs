//! Lenient parsing of provider output into plot models.
//!
//! Models wrap JSON in prose or markdown fences and drop optional fields; the
//! parser tolerates both and fills gaps with deterministic defaults.

use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::models::{Act, Importance, PlotPoint, PlotSuggestion, SuggestionType};
use crate::PlotweaveError;

/// Beat type used when the provider omits one.
pub const DEFAULT_POINT_TYPE: &str = "turning_point";

#[derive(Debug, Deserialize)]
struct RawStructure {
    #[serde(default)]
    acts: Vec<RawAct>,
}

#[derive(Debug, Deserialize)]
struct RawAct {
    #[serde(default, alias = "actNumber", alias = "number")]
    act_number: Option<u32>,
    #[serde(default, alias = "title")]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "plotPoints")]
    plot_points: Vec<RawPlotPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPlotPoint {
    #[serde(default, rename = "type", alias = "point_type", alias = "pointType")]
    point_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    importance: Option<String>,
    #[serde(default)]
    position: Option<f64>,
    #[serde(default)]
    chapter: Option<String>,
    #[serde(default)]
    characters: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    #[serde(default, rename = "type", alias = "suggestion_type", alias = "suggestionType")]
    suggestion_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    impact: Option<String>,
}

/// Pull the JSON payload out of a model response.
///
/// A fenced code block wins; otherwise the first balanced object or array.
pub fn extract_json(text: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(text) {
        if let Some(json) = balanced_json(fenced) {
            return Some(json);
        }
    }
    balanced_json(text)
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// First balanced `{...}` or `[...]`, honoring string literals and escapes.
fn balanced_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_value(text: &str) -> Result<Value, PlotweaveError> {
    let json = extract_json(text)
        .ok_or_else(|| PlotweaveError::Parse("no JSON object or array in response".into()))?;
    Ok(serde_json::from_str(json)?)
}

/// Parse acts from a structure or alternatives response.
///
/// Accepts `{"acts": [...]}` or a bare array of acts. Acts come back sorted by
/// declared number and renumbered from 1; `duration` is left at 0 for the
/// caller to distribute.
pub fn parse_acts(text: &str) -> Result<Vec<Act>, PlotweaveError> {
    let raw_acts = match parse_value(text)? {
        Value::Array(items) => serde_json::from_value::<Vec<RawAct>>(Value::Array(items))?,
        obj @ Value::Object(_) => serde_json::from_value::<RawStructure>(obj)?.acts,
        other => {
            return Err(PlotweaveError::Parse(format!(
                "expected JSON object or array, got {}",
                other
            )))
        }
    };

    let mut numbered: Vec<(u32, RawAct)> = raw_acts
        .into_iter()
        .enumerate()
        .map(|(i, act)| (act.act_number.unwrap_or(i as u32 + 1), act))
        .collect();
    numbered.sort_by_key(|(number, _)| *number);

    let total_points: usize = numbered.iter().map(|(_, a)| a.plot_points.len()).sum();
    let mut global_index = 0usize;

    let acts = numbered
        .into_iter()
        .enumerate()
        .map(|(i, (_, raw))| {
            let act_number = i as u32 + 1;
            let plot_points = raw
                .plot_points
                .into_iter()
                .map(|point| {
                    let position = point
                        .position
                        .map(|p| p.clamp(0.0, 100.0).round() as u8)
                        .unwrap_or_else(|| default_position(global_index, total_points));
                    global_index += 1;
                    into_plot_point(point, position)
                })
                .collect();

            Act {
                id: Uuid::new_v4().to_string(),
                act_number,
                name: non_blank(raw.name).unwrap_or_else(|| format!("Act {}", act_number)),
                description: non_blank(raw.description),
                plot_points,
                chapters: Vec::new(),
                duration: 0,
            }
        })
        .collect();

    Ok(acts)
}

/// Evenly spaced position for the i-th of `count` plot points.
pub fn default_position(index: usize, count: usize) -> u8 {
    let pos = ((index + 1) as f64 * 100.0 / (count + 1) as f64).round();
    pos.clamp(0.0, 100.0) as u8
}

fn into_plot_point(raw: RawPlotPoint, position: u8) -> PlotPoint {
    let point_type = non_blank(raw.point_type)
        .map(|t| crate::models::normalize_point_type(&t))
        .unwrap_or_else(|| DEFAULT_POINT_TYPE.to_string());
    let importance = match raw.importance.as_deref().map(|s| s.trim().to_lowercase()) {
        Some(ref s) if s == "minor" => Importance::Minor,
        _ => Importance::Major,
    };
    let title = non_blank(raw.title).unwrap_or_else(|| point_type.replace('_', " "));

    PlotPoint {
        id: Uuid::new_v4().to_string(),
        point_type,
        title,
        description: raw.description.unwrap_or_default(),
        chapter: non_blank(raw.chapter),
        characters: raw.characters,
        importance,
        position: Some(position),
    }
}

/// Parse a suggestions response. Entries with an unknown type or no title are dropped.
pub fn parse_suggestions(text: &str) -> Result<Vec<PlotSuggestion>, PlotweaveError> {
    let items = match parse_value(text)? {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PlotweaveError::Parse(
                    "expected a JSON array of suggestions".into(),
                ))
            }
        },
        other => {
            return Err(PlotweaveError::Parse(format!(
                "expected a JSON array of suggestions, got {}",
                other
            )))
        }
    };

    let suggestions = items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<RawSuggestion>(item).ok())
        .filter_map(|raw| {
            let suggestion_type = SuggestionType::parse_loose(raw.suggestion_type.as_deref()?)?;
            Some(PlotSuggestion {
                id: Uuid::new_v4().to_string(),
                suggestion_type,
                title: non_blank(raw.title)?,
                description: raw.description.unwrap_or_default(),
                impact: non_blank(raw.impact),
            })
        })
        .collect();

    Ok(suggestions)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_prefers_fenced_block() {
        let text = "Here you go {not json}\n```json\n{\"acts\": []}\n```\ntrailing";
        assert_eq!(extract_json(text), Some("{\"acts\": []}"));
    }

    #[test]
    fn test_extract_balanced_ignores_braces_in_strings() {
        let text = r#"Sure! {"acts": [{"name": "The } trap"}]} and more {"x": 1}"#;
        assert_eq!(
            extract_json(text),
            Some(r#"{"acts": [{"name": "The } trap"}]}"#)
        );
    }

    #[test]
    fn test_extract_none_without_json() {
        assert_eq!(extract_json("no structure here"), None);
        assert_eq!(extract_json("{ unterminated"), None);
    }

    #[test]
    fn test_parse_acts_fills_defaults() {
        let text = r#"{"acts": [
            {"actNumber": 2, "plotPoints": [{"type": "Climax", "title": "Fall"}]},
            {"actNumber": 1, "name": "Opening", "plotPoints": [
                {"type": "inciting-incident", "title": "Spark", "importance": "minor"}
            ]},
            {"actNumber": 3, "name": "Empty", "plotPoints": []}
        ]}"#;
        let acts = parse_acts(text).unwrap();

        assert_eq!(acts.len(), 3);
        assert_eq!(acts[0].name, "Opening");
        assert_eq!(acts[0].act_number, 1);
        assert_eq!(acts[1].name, "Act 2");
        assert_eq!(acts[2].name, "Empty");
        assert!(acts[2].plot_points.is_empty());

        let spark = &acts[0].plot_points[0];
        assert_eq!(spark.point_type, "inciting_incident");
        assert_eq!(spark.importance, Importance::Minor);
        assert_eq!(spark.position, Some(33));

        let fall = &acts[1].plot_points[0];
        assert_eq!(fall.point_type, "climax");
        assert_eq!(fall.importance, Importance::Major);
        assert_eq!(fall.position, Some(67));
    }

    #[test]
    fn test_parse_acts_renumbers_gaps() {
        let acts = parse_acts(r#"[{"actNumber": 4}, {"actNumber": 9}]"#).unwrap();
        let numbers: Vec<u32> = acts.iter().map(|a| a.act_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_parse_acts_rejects_garbage() {
        assert!(matches!(
            parse_acts("I cannot help with that."),
            Err(PlotweaveError::Parse(_))
        ));
        assert!(parse_acts("{\"acts\": \"nope\"}").is_err());
    }

    #[test]
    fn test_parse_suggestions_drops_unknown() {
        let text = r#"```
[
  {"type": "plot_twist", "title": "Mirror", "description": "The mentor is the thief"},
  {"type": "cameo", "title": "Nope"},
  {"type": "subplot", "title": "  "},
  {"type": "Theme Development", "title": "Debt", "impact": "high"}
]
```"#;
        let suggestions = parse_suggestions(text).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].suggestion_type, SuggestionType::PlotTwist);
        assert_eq!(suggestions[1].impact.as_deref(), Some("high"));
    }

    #[test]
    fn test_default_position_spacing() {
        assert_eq!(default_position(0, 1), 50);
        assert_eq!(default_position(0, 3), 25);
        assert_eq!(default_position(2, 3), 75);
    }
}
