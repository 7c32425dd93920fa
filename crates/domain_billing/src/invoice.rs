//! Printable invoice snapshots
//!
//! Invoices are generated by the billing API; this side only decodes them
//! for printing. Totals are recomputed from the line items when the server
//! leaves them out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{Money, PatientId};

use crate::entry::BillingEntry;
use crate::lenient;

/// Patient block printed on an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePatient {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PatientId>,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text_opt")]
    pub phone: Option<String>,
    #[serde(default)]
    pub uh_id: Option<String>,
}

/// An invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Human-readable invoice number
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Billed patient
    #[serde(default)]
    pub patient: Option<InvoicePatient>,
    /// Line items
    #[serde(default, alias = "billing", alias = "lineItems", deserialize_with = "lenient::vec_or_empty")]
    pub items: Vec<BillingEntry>,
    /// Total billed, as reported by the server
    #[serde(default, deserialize_with = "lenient::money_opt")]
    pub total: Option<Money>,
    /// Total paid, as reported by the server
    #[serde(default, deserialize_with = "lenient::money_opt")]
    pub paid: Option<Money>,
    /// Remainder, as reported by the server
    #[serde(default, deserialize_with = "lenient::money_opt")]
    pub remaining: Option<Money>,
    /// When the invoice was generated
    #[serde(default, deserialize_with = "lenient::datetime_opt")]
    pub generated_at: Option<DateTime<Utc>>,
}

impl Invoice {
    /// Total billed; summed from the line items when not reported
    pub fn total_amount(&self) -> Money {
        self.total
            .map(|t| t.max_zero())
            .unwrap_or_else(|| self.items.iter().map(BillingEntry::effective_amount).sum())
    }

    /// Total paid; summed from the line items when not reported
    pub fn paid_amount(&self) -> Money {
        self.paid
            .map(|p| p.max_zero())
            .unwrap_or_else(|| self.items.iter().map(BillingEntry::effective_paid).sum())
    }

    /// Amount still due, never negative
    pub fn balance_due(&self) -> Money {
        match self.remaining {
            Some(remaining) => remaining.max_zero(),
            None => self.total_amount().saturating_sub(self.paid_amount()),
        }
    }

    /// Returns true if nothing is due
    pub fn is_settled(&self) -> bool {
        self.balance_due().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_recomputed_from_items() {
        let invoice: Invoice = serde_json::from_str(
            r#"{"invoiceNumber": "INV-2024-0042",
                "patient": {"_id": "p1", "name": "Farah", "phone": null},
                "billing": [
                    {"type": "consultation", "amount": 500, "paidAmount": 500},
                    {"type": "service", "amount": 300, "paidAmount": 100}
                ]}"#,
        )
        .unwrap();

        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.total_amount(), Money::from_major(800));
        assert_eq!(invoice.paid_amount(), Money::from_major(600));
        assert_eq!(invoice.balance_due(), Money::from_major(200));
        assert!(!invoice.is_settled());
    }

    #[test]
    fn test_reported_totals_take_precedence() {
        let invoice: Invoice = serde_json::from_str(
            r#"{"total": 1000, "paid": 1200, "lineItems": null, "generatedAt": "2024-06-10T10:00:00Z"}"#,
        )
        .unwrap();

        assert!(invoice.items.is_empty());
        assert!(invoice.balance_due().is_zero());
        assert!(invoice.generated_at.is_some());
    }
}
