//! Visual edit plan produced by the planning agent
//!
//! A plan is an ordered list of editing actions, each naming a tool and the
//! image(s) it targets. The plan is model output and is sent back verbatim
//! with the execution request, so decoding is lenient: unknown tools, unknown
//! argument keys and loosely typed numbers are kept as received. Typed
//! accessors read what the dashboard and the summary need.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Editing tool an action invokes on the device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionTool {
    ChangeDuration,
    ApplyEffect,
    ApplyAnimation,
    AddTransition,
    /// A tool this client does not know; passed through untouched
    Other(String),
}

impl ActionTool {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ChangeDuration => "change_duration",
            Self::ApplyEffect => "apply_effect",
            Self::ApplyAnimation => "apply_animation",
            Self::AddTransition => "add_transition",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ActionTool {
    fn from(name: String) -> Self {
        match name.as_str() {
            "change_duration" => Self::ChangeDuration,
            "apply_effect" => Self::ApplyEffect,
            "apply_animation" => Self::ApplyAnimation,
            "add_transition" => Self::AddTransition,
            _ => Self::Other(name),
        }
    }
}

impl From<ActionTool> for String {
    fn from(tool: ActionTool) -> Self {
        match tool {
            ActionTool::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ActionTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Animation slot for `apply_animation`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationType {
    In,
    Out,
    Combo,
}

impl AnimationType {
    /// Case-insensitive parse; unknown slots are `None`
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Some(Self::In),
            "OUT" => Some(Self::Out),
            "COMBO" => Some(Self::Combo),
            _ => None,
        }
    }
}

/// Arguments of a plan action, kept exactly as the planner sent them
///
/// Which keys are present depends on the tool: transitions use the image
/// pair, everything else uses `image_idx`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionArgs(Map<String, Value>);

impl ActionArgs {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn image_idx(&self) -> Option<usize> {
        self.index("image_idx")
    }

    pub fn image1_idx(&self) -> Option<usize> {
        self.index("image1_idx")
    }

    pub fn image2_idx(&self) -> Option<usize> {
        self.index("image2_idx")
    }

    pub fn duration(&self) -> Option<f64> {
        self.get("duration").and_then(lenient_f64)
    }

    /// Effect names; a single string counts as a one-element list
    pub fn effects_list(&self) -> Vec<String> {
        match self.get("effects_list") {
            Some(Value::Array(items)) => items.iter().filter_map(lenient_string).collect(),
            Some(value) => lenient_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    pub fn animation_name(&self) -> Option<String> {
        self.get("animation_name").and_then(lenient_string)
    }

    pub fn animation_type(&self) -> Option<AnimationType> {
        self.get("animation_type")
            .and_then(Value::as_str)
            .and_then(AnimationType::parse)
    }

    pub fn transition_type(&self) -> Option<String> {
        self.get("transition_type").and_then(lenient_string)
    }

    pub fn all_apply(&self) -> Option<bool> {
        match self.get("all_apply")? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn index(&self, key: &str) -> Option<usize> {
        let n = self.get(key).and_then(lenient_f64)?;
        (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
    }
}

/// Number, or a string holding one
fn lenient_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Missing and `null` args both mean "no arguments"
fn args_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ActionArgs, D::Error> {
    Ok(Option::<ActionArgs>::deserialize(deserializer)?.unwrap_or_default())
}

/// One step of the visual plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualPlanAction {
    pub tool: ActionTool,
    #[serde(default, deserialize_with = "args_or_empty")]
    pub args: ActionArgs,
    /// Keys beside `tool` and `args`, echoed back unchanged
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisualPlanAction {
    /// Short human-readable description used by the dashboard
    pub fn describe(&self) -> String {
        let args = &self.args;
        match &self.tool {
            ActionTool::ChangeDuration => format!(
                "image {} -> {}s",
                fmt_idx(args.image_idx()),
                args.duration().map(|d| d.to_string()).unwrap_or_else(|| "?".to_string())
            ),
            ActionTool::ApplyEffect => format!("image {}: {}", fmt_idx(args.image_idx()), args.effects_list().join(", ")),
            ActionTool::ApplyAnimation => format!(
                "image {}: {}",
                fmt_idx(args.image_idx()),
                args.animation_name().unwrap_or_else(|| "?".to_string())
            ),
            ActionTool::AddTransition => format!(
                "{} -> {}: {}",
                fmt_idx(args.image1_idx()),
                fmt_idx(args.image2_idx()),
                args.transition_type().unwrap_or_else(|| "?".to_string())
            ),
            ActionTool::Other(_) => match args.image_idx() {
                Some(idx) => format!("image {}", idx),
                None => String::new(),
            },
        }
    }

    /// Index of the image this action edits, if it targets a single image
    pub fn target_image(&self) -> Option<usize> {
        self.args.image_idx().or_else(|| self.args.image1_idx())
    }
}

fn fmt_idx(idx: Option<usize>) -> String {
    idx.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string())
}

/// Complete visual plan with the director's reasoning
///
/// Only a missing `plan` list makes the payload unusable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualPlan {
    #[serde(default)]
    pub thought_process: String,
    #[serde(default)]
    pub music_thoughts: String,
    pub plan: Vec<VisualPlanAction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VisualPlan {
    /// Number of actions using the given tool
    pub fn count_tool(&self, tool: &ActionTool) -> usize {
        self.plan.iter().filter(|a| &a.tool == tool).count()
    }

    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plan() -> VisualPlan {
        serde_json::from_value(serde_json::json!({
            "thought_process": "fast cuts",
            "music_thoughts": "phonk",
            "plan": [
                {"tool": "change_duration", "args": {"image_idx": 0, "duration": 1.5}},
                {"tool": "apply_effect", "args": {"image_idx": 0, "effects_list": ["Glitch", "Shake"]}},
                {"tool": "apply_animation", "args": {"image_idx": 1, "animation_name": "Zoom", "animation_type": "IN"}},
                {"tool": "add_transition", "args": {"image1_idx": 0, "image2_idx": 1, "transition_type": "Flash"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_plan_deserializes_all_tools() {
        let plan = sample_plan();
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.plan[2].args.animation_type(), Some(AnimationType::In));
        assert_eq!(plan.count_tool(&ActionTool::ApplyEffect), 1);
        assert_eq!(plan.count_tool(&ActionTool::AddTransition), 1);
    }

    #[test]
    fn test_unknown_tool_passes_through() {
        let action: VisualPlanAction =
            serde_json::from_value(serde_json::json!({"tool": "add_text", "args": {"image_idx": 2, "text": "hi"}}))
                .unwrap();
        assert_eq!(action.tool, ActionTool::Other("add_text".to_string()));
        assert_eq!(action.describe(), "image 2");
        assert_eq!(serde_json::to_value(&action).unwrap()["tool"], "add_text");
    }

    #[test]
    fn test_loose_argument_types() {
        let plan: VisualPlan = serde_json::from_value(serde_json::json!({
            "plan": [
                {"tool": "apply_animation", "args": {"image_idx": 1.0, "animation_name": "Zoom", "animation_type": "In"}},
                {"tool": "change_duration", "args": {"image_idx": "2", "duration": "2.5"}},
                {"tool": "apply_effect", "args": {"image_idx": 0, "effects_list": "Glitch"}},
                {"tool": "apply_effect", "args": null}
            ]
        }))
        .unwrap();
        assert_eq!(plan.plan[0].args.image_idx(), Some(1));
        assert_eq!(plan.plan[0].args.animation_type(), Some(AnimationType::In));
        assert_eq!(plan.plan[1].args.image_idx(), Some(2));
        assert_eq!(plan.plan[1].args.duration(), Some(2.5));
        assert_eq!(plan.plan[2].args.effects_list(), vec!["Glitch".to_string()]);
        assert_eq!(plan.plan[3].target_image(), None);
    }

    #[test]
    fn test_fractional_index_is_not_an_image() {
        let args: ActionArgs = serde_json::from_value(serde_json::json!({"image_idx": 1.5})).unwrap();
        assert_eq!(args.image_idx(), None);
    }

    #[test]
    fn test_missing_plan_is_rejected() {
        let result: Result<VisualPlan, _> = serde_json::from_value(serde_json::json!({"thought_process": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_reserializes_unchanged() {
        let raw = serde_json::json!({
            "thought_process": "t",
            "music_thoughts": "m",
            "plan": [
                {"tool": "apply_animation", "args": {"image_idx": 1.0, "animation_type": "In", "speed": "fast"}, "note": "x"},
                {"tool": "add_text", "args": {"text": "hello", "position": [0.5, 0.5]}}
            ],
            "version": 2
        });
        let plan: VisualPlan = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&plan).unwrap(), raw);
    }

    #[test]
    fn test_describe() {
        let plan = sample_plan();
        assert_eq!(plan.plan[0].describe(), "image 0 -> 1.5s");
        assert_eq!(plan.plan[1].describe(), "image 0: Glitch, Shake");
        assert_eq!(plan.plan[3].describe(), "0 -> 1: Flash");
    }

    #[test]
    fn test_target_image() {
        let plan = sample_plan();
        assert_eq!(plan.plan[1].target_image(), Some(0));
        assert_eq!(plan.plan[3].target_image(), Some(0));
    }
}
