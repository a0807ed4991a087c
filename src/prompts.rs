//! Prompt texts for the tip and plan endpoints.
//!
//! Both prompts ask for Nepali output in plain text, since the replies
//! are shown verbatim and may be read aloud.

use kisan_sathi_core::models::{PlanRequest, TipRequest};

// ---------------------------------------------------------------------------
// POST /tip
// ---------------------------------------------------------------------------

pub const TIP_SYSTEM_PROMPT: &str = r#"You are Kisan Sathi, an agricultural extension officer who advises smallholder farmers in Nepal.
Give exactly ONE short, practical farming tip the farmer can act on today.
Write in simple Nepali (Devanagari script). At most two sentences.
No markdown, no bullet points, no greeting, no disclaimers.
Prefer low-cost, locally available methods. Mention quantities or timings when they matter."#;

pub fn tip_user_prompt(req: &TipRequest) -> String {
    let mut lines = Vec::new();
    match req.crop.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(crop) => lines.push(format!("Crop: {}", crop.trim())),
        None => lines.push("Crop: any common crop grown in Nepal this season".to_string()),
    }
    if let Some(stage) = req.stage.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("Growth stage: {}", stage.trim()));
    }
    if let Some(location) = req.location.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(format!("Location: {}", location.trim()));
    }
    lines.push("Give today's tip.".to_string());
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// POST /plan
// ---------------------------------------------------------------------------

pub const PLAN_SYSTEM_PROMPT: &str = r#"You are Kisan Sathi, an agricultural extension officer who advises smallholder farmers in Nepal.
Write the farmer's action plan for TOMORROW in simple Nepali (Devanagari script).
Use exactly three short sections, each starting on its own line with its label:
बिहान: (morning)
दिउँसो: (afternoon)
साँझ: (evening)
Each section has one to three concrete tasks suited to the crop and growth stage.
Do not repeat advice the farmer has already received unless it is a follow-up.
No markdown, no headings other than the three labels, no greeting."#;

pub fn plan_user_prompt(req: &PlanRequest) -> String {
    let mut out = format!("Crop: {}\nGrowth stage: {}\n", req.crop.trim(), req.stage.trim());
    if let Some(location) = req.location.as_deref().filter(|l| !l.trim().is_empty()) {
        out.push_str(&format!("Location: {}\n", location.trim()));
    }
    if req.recent_tips.is_empty() {
        out.push_str("Recent advice: none\n");
    } else {
        out.push_str("Recent advice already given:\n");
        for tip in &req.recent_tips {
            out.push_str(&format!("- {}\n", tip.trim()));
        }
    }
    out.push_str("Write tomorrow's plan.");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tip_prompt_without_fields() {
        let prompt = tip_user_prompt(&TipRequest::default());
        assert!(prompt.contains("any common crop"));
        assert!(!prompt.contains("Location"));
    }

    #[test]
    fn test_plan_prompt_lists_recent_tips() {
        let req = PlanRequest {
            crop: "tomato".into(),
            stage: "fruiting".into(),
            location: Some("Kaski".into()),
            recent_tips: vec!["Stake the plants".into(), "Mulch the beds".into()],
        };
        let prompt = plan_user_prompt(&req);
        assert!(prompt.contains("Crop: tomato"));
        assert!(prompt.contains("Location: Kaski"));
        assert!(prompt.contains("- Stake the plants\n- Mulch the beds"));
    }
}
