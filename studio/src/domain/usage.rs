//! Token usage and pricing reported when planning completes

use serde::{Deserialize, Serialize};

/// Token counts for one planning step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepUsage {
    pub prompt_tokens: u64,
    pub candidates_tokens: u64,
    pub thinking_tokens: u64,
    pub cached_tokens: u64,
    pub total_tokens: u64,
}

/// Usage per planning step; steps that did not run are `None`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageBreakdown {
    pub visual_plan: Option<StepUsage>,
    pub music_plan: Option<StepUsage>,
    pub final_plan: Option<StepUsage>,
}

impl UsageBreakdown {
    /// Steps in display order with their labels
    pub fn steps(&self) -> [(&'static str, Option<&StepUsage>); 3] {
        [
            ("Visual Plan", self.visual_plan.as_ref()),
            ("Music Plan", self.music_plan.as_ref()),
            ("Final Plan", self.final_plan.as_ref()),
        ]
    }
}

/// Aggregate pricing computed by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pricing {
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_thinking_tokens: u64,
    pub total_cached_tokens: u64,
    pub total_tokens: u64,
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub total_cost_usd: f64,
}

/// Usage data stored once planning completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub usage_breakdown: UsageBreakdown,
    pub pricing: Pricing,
}

/// Format a token count the way the dashboard shows it (`12.3k`)
pub fn format_tokens(count: u64) -> String {
    if count >= 1000 {
        format!("{:.1}k", count as f64 / 1000.0)
    } else {
        count.to_string()
    }
}

/// Format a USD cost with extra precision for sub-cent amounts
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("${:.4}", cost)
    } else {
        format!("${:.2}", cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tokens() {
        assert_eq!(format_tokens(999), "999");
        assert_eq!(format_tokens(1000), "1.0k");
        assert_eq!(format_tokens(12_345), "12.3k");
    }

    #[test]
    fn test_format_cost() {
        assert_eq!(format_cost(0.001234), "$0.0012");
        assert_eq!(format_cost(1.5), "$1.50");
    }

    #[test]
    fn test_breakdown_with_missing_steps() {
        let breakdown: UsageBreakdown = serde_json::from_value(serde_json::json!({
            "visual_plan": {"prompt_tokens": 100, "candidates_tokens": 50, "total_tokens": 150},
            "music_plan": null
        }))
        .unwrap();
        let steps = breakdown.steps();
        assert_eq!(steps[0].1.map(|u| u.total_tokens), Some(150));
        assert!(steps[1].1.is_none());
        assert!(steps[2].1.is_none());
    }
}
