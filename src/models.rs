use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One customer's row of sales and engagement data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Q1")]
    pub q1: f64,
    #[serde(rename = "Discount Q1")]
    pub discount_q1: f64,
    #[serde(rename = "Q2")]
    pub q2: f64,
    #[serde(rename = "Discount Q2")]
    pub discount_q2: f64,
    #[serde(rename = "Q3")]
    pub q3: f64,
    #[serde(rename = "Discount Q3")]
    pub discount_q3: f64,
    #[serde(rename = "Q4")]
    pub q4: f64,
    #[serde(rename = "Discount Q4")]
    pub discount_q4: f64,
    #[serde(rename = "Total")]
    pub total: f64,
    #[serde(rename = "Interactions")]
    pub interactions: u64,
    #[serde(rename = "Total Contacts")]
    pub total_contacts: u64,
}

impl Record {
    pub fn average_discount(&self) -> f64 {
        (self.discount_q1 + self.discount_q2 + self.discount_q3 + self.discount_q4) / 4.0
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Interactions => self.interactions as f64,
            Metric::TotalContacts => self.total_contacts as f64,
            Metric::DiscountQ1 => self.discount_q1,
            Metric::DiscountQ2 => self.discount_q2,
            Metric::DiscountQ3 => self.discount_q3,
            Metric::DiscountQ4 => self.discount_q4,
        }
    }

    /// Float fields paired with their column names, for finiteness checks.
    pub(crate) fn numeric_fields(&self) -> [(&'static str, f64); 9] {
        [
            ("Q1", self.q1),
            ("Discount Q1", self.discount_q1),
            ("Q2", self.q2),
            ("Discount Q2", self.discount_q2),
            ("Q3", self.q3),
            ("Discount Q3", self.discount_q3),
            ("Q4", self.q4),
            ("Discount Q4", self.discount_q4),
            ("Total", self.total),
        ]
    }
}

/// A single upload's worth of records.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: Uuid,
    pub uploaded_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uploaded_at: Utc::now(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// The metrics compared against the high-performer baseline, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Interactions,
    TotalContacts,
    DiscountQ1,
    DiscountQ2,
    DiscountQ3,
    DiscountQ4,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Interactions,
        Metric::TotalContacts,
        Metric::DiscountQ1,
        Metric::DiscountQ2,
        Metric::DiscountQ3,
        Metric::DiscountQ4,
    ];

    /// Column name of the metric in the uploaded file.
    pub fn column(self) -> &'static str {
        match self {
            Metric::Interactions => "Interactions",
            Metric::TotalContacts => "Total Contacts",
            Metric::DiscountQ1 => "Discount Q1",
            Metric::DiscountQ2 => "Discount Q2",
            Metric::DiscountQ3 => "Discount Q3",
            Metric::DiscountQ4 => "Discount Q4",
        }
    }

    pub fn recommendation(self, gap: f64) -> String {
        match self {
            Metric::Interactions => {
                format!("Increase interactions by {gap:.1}% to match high performers.")
            }
            Metric::TotalContacts => {
                format!("Increase total contacts by {gap:.1}% to strengthen relationships.")
            }
            quarter => format!(
                "Increase {} by {gap:.1}% to align with high performers.",
                quarter.column()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestionEntry {
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Total Sales")]
    pub total_sales: f64,
    #[serde(rename = "Suggestions")]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasonEntry {
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "Total Sales")]
    pub total_sales: f64,
    #[serde(rename = "Reasons")]
    pub reasons: Vec<String>,
}
