//! Estimate request form and its section completion rules.

use serde::{Deserialize, Serialize};

use super::accordion::Accordion;
use super::{is_blank, looks_like_email};

/// Minimum trimmed length of a project description.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// How the customer wants to be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactMethod {
    Email,
    Phone,
    Text,
}

/// Current values of the estimate request form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimateForm {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub project_type: Option<String>,
    pub trades: Vec<String>,
    pub description: String,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub contact_method: Option<ContactMethod>,
}

/// Logical sections of the estimate form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimateSection {
    CustomerInfo,
    ProjectType,
    Trades,
    Description,
    BudgetTimeline,
    ContactMethod,
}

impl EstimateSection {
    pub const ALL: [EstimateSection; 6] = [
        EstimateSection::CustomerInfo,
        EstimateSection::ProjectType,
        EstimateSection::Trades,
        EstimateSection::Description,
        EstimateSection::BudgetTimeline,
        EstimateSection::ContactMethod,
    ];
}

impl EstimateForm {
    /// Whether a section is complete given the current values.
    pub fn is_complete(&self, section: EstimateSection) -> bool {
        match section {
            EstimateSection::CustomerInfo => {
                !is_blank(&self.customer_name) && looks_like_email(&self.customer_email)
            }
            EstimateSection::ProjectType => {
                self.project_type.as_deref().is_some_and(|t| !is_blank(t))
            }
            EstimateSection::Trades => self.trades.iter().any(|t| !is_blank(t)),
            EstimateSection::Description => {
                self.description.trim().chars().count() >= MIN_DESCRIPTION_CHARS
            }
            EstimateSection::BudgetTimeline => {
                self.budget.as_deref().is_some_and(|b| !is_blank(b))
                    && self.timeline.as_deref().is_some_and(|t| !is_blank(t))
            }
            EstimateSection::ContactMethod => match self.contact_method {
                None => false,
                Some(ContactMethod::Email) => true,
                Some(ContactMethod::Phone) | Some(ContactMethod::Text) => {
                    self.customer_phone.as_deref().is_some_and(|p| !is_blank(p))
                }
            },
        }
    }

    /// Completion of every section, in form order.
    pub fn completion(&self) -> Vec<(EstimateSection, bool)> {
        EstimateSection::ALL
            .into_iter()
            .map(|s| (s, self.is_complete(s)))
            .collect()
    }

    pub fn incomplete(&self) -> Vec<EstimateSection> {
        EstimateSection::ALL
            .into_iter()
            .filter(|s| !self.is_complete(*s))
            .collect()
    }

    /// True when every section is complete.
    pub fn is_ready(&self) -> bool {
        EstimateSection::ALL.iter().all(|s| self.is_complete(*s))
    }
}

/// Accordion panels of the estimate form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EstimatePanel {
    CustomerInfo,
    /// Groups the project sections
    ProjectInfo,
    ProjectType,
    Trades,
    Description,
    BudgetTimeline,
    ContactMethod,
}

impl EstimatePanel {
    /// The section a panel edits. `ProjectInfo` only groups other panels.
    pub fn section(&self) -> Option<EstimateSection> {
        match self {
            EstimatePanel::CustomerInfo => Some(EstimateSection::CustomerInfo),
            EstimatePanel::ProjectInfo => None,
            EstimatePanel::ProjectType => Some(EstimateSection::ProjectType),
            EstimatePanel::Trades => Some(EstimateSection::Trades),
            EstimatePanel::Description => Some(EstimateSection::Description),
            EstimatePanel::BudgetTimeline => Some(EstimateSection::BudgetTimeline),
            EstimatePanel::ContactMethod => Some(EstimateSection::ContactMethod),
        }
    }

    /// The estimate form layout.
    pub fn accordion() -> Accordion<EstimatePanel> {
        Accordion::new()
            .with_panel(EstimatePanel::CustomerInfo)
            .with_child(EstimatePanel::ProjectInfo, EstimatePanel::ProjectType)
            .with_child(EstimatePanel::ProjectInfo, EstimatePanel::Trades)
            .with_child(EstimatePanel::ProjectInfo, EstimatePanel::Description)
            .with_child(EstimatePanel::ProjectInfo, EstimatePanel::BudgetTimeline)
            .with_panel(EstimatePanel::ContactMethod)
    }
}

impl EstimateForm {
    /// Whether a panel is complete. A grouping panel is complete when all
    /// of its nested panels are.
    pub fn is_panel_complete(&self, layout: &Accordion<EstimatePanel>, panel: EstimatePanel) -> bool {
        match panel.section() {
            Some(section) => self.is_complete(section),
            None => layout
                .children(panel)
                .into_iter()
                .all(|child| self.is_panel_complete(layout, child)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_form() -> EstimateForm {
        EstimateForm {
            customer_name: "Dana Smith".to_string(),
            customer_email: "dana@example.com".to_string(),
            customer_phone: Some("555-0100".to_string()),
            project_type: Some("remodel".to_string()),
            trades: vec!["plumbing".to_string(), "electrical".to_string()],
            description: "Full kitchen remodel with new sink and lighting".to_string(),
            budget: Some("10k-25k".to_string()),
            timeline: Some("1-3 months".to_string()),
            contact_method: Some(ContactMethod::Phone),
        }
    }

    #[test]
    fn test_empty_form_is_incomplete_everywhere() {
        let form = EstimateForm::default();
        assert_eq!(form.incomplete(), EstimateSection::ALL.to_vec());
        assert!(!form.is_ready());
    }

    #[test]
    fn test_complete_form() {
        let form = complete_form();
        assert!(form.is_ready());
        assert!(form.completion().iter().all(|(_, done)| *done));
    }

    #[test]
    fn test_completion_follows_current_values() {
        let mut form = complete_form();

        form.customer_email = "not-an-email".to_string();
        assert_eq!(form.incomplete(), vec![EstimateSection::CustomerInfo]);

        form.customer_email = "dana@example.com".to_string();
        form.trades = vec!["  ".to_string()];
        assert_eq!(form.incomplete(), vec![EstimateSection::Trades]);
    }

    #[test]
    fn test_description_length_is_trimmed() {
        let mut form = complete_form();
        form.description = format!("   {}   ", "x".repeat(MIN_DESCRIPTION_CHARS - 1));
        assert!(!form.is_complete(EstimateSection::Description));

        form.description = "x".repeat(MIN_DESCRIPTION_CHARS);
        assert!(form.is_complete(EstimateSection::Description));
    }

    #[test]
    fn test_budget_and_timeline_both_required() {
        let mut form = complete_form();
        form.timeline = None;
        assert!(!form.is_complete(EstimateSection::BudgetTimeline));
    }

    #[test]
    fn test_phone_contact_needs_phone_number() {
        let mut form = complete_form();
        form.customer_phone = None;
        assert!(!form.is_complete(EstimateSection::ContactMethod));

        form.contact_method = Some(ContactMethod::Email);
        assert!(form.is_complete(EstimateSection::ContactMethod));
    }

    #[test]
    fn test_project_info_panel_tracks_children() {
        let layout = EstimatePanel::accordion();
        let mut form = complete_form();
        assert!(form.is_panel_complete(&layout, EstimatePanel::ProjectInfo));

        form.budget = None;
        assert!(!form.is_panel_complete(&layout, EstimatePanel::ProjectInfo));
        assert!(form.is_panel_complete(&layout, EstimatePanel::CustomerInfo));
    }

    #[test]
    fn test_estimate_layout() {
        let mut layout = EstimatePanel::accordion();
        layout.open(EstimatePanel::Description);
        assert!(layout.is_open(EstimatePanel::ProjectInfo));

        layout.open(EstimatePanel::Trades);
        assert_eq!(layout.open_child(), Some(EstimatePanel::Trades));
        assert!(!layout.is_open(EstimatePanel::Description));
    }

    #[test]
    fn test_deserialize_partial_json() {
        let form: EstimateForm = serde_json::from_str(
            r#"{"customerName":"Lee","customerEmail":"lee@example.com","contactMethod":"email"}"#,
        )
        .unwrap();

        assert!(form.is_complete(EstimateSection::CustomerInfo));
        assert!(form.is_complete(EstimateSection::ContactMethod));
        assert!(!form.is_complete(EstimateSection::Trades));
    }
}
