//! Bill record: initial data and form shape of a QR bill

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainResult;
use crate::domain::path::FieldPath;
use crate::domain::rules::{Rule, RuleSet};
use crate::domain::tree::{FieldTree, FieldTreeBuilder};

/// Smallest and largest amount accepted on a bill.
pub const AMOUNT_MIN: f64 = 0.01;
pub const AMOUNT_MAX: f64 = 999_999_999.99;

/// Postal address, shared by creditor, final creditor and debtor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub name: Option<String>,
    pub street: Option<String>,
    pub house_no: Option<String>,
    pub postal_code: Option<String>,
    pub town: Option<String>,
    pub country_code: Option<String>,
}

impl Address {
    /// Fields in form declaration order.
    fn declare(&self, g: FieldTreeBuilder) -> FieldTreeBuilder {
        g.leaf("name", self.name.clone())
            .leaf("street", self.street.clone())
            .leaf("houseNo", self.house_no.clone())
            .leaf("countryCode", self.country_code.clone())
            .leaf("postalCode", self.postal_code.clone())
            .leaf("town", self.town.clone())
    }
}

/// Payment record edited through the bill data form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BillRecord {
    pub account: Option<String>,
    pub creditor: Address,
    pub final_creditor: Address,
    pub currency: Option<String>,
    pub amount: Option<f64>,
    pub reference_no: Option<String>,
    pub additional_info: Option<String>,
    pub debtor: Address,
    pub due_date: Option<NaiveDate>,
}

impl BillRecord {
    /// Record the form opens with.
    pub fn sample() -> Self {
        Self {
            account: Some("CH93 0076 2011 6238 5295 7".into()),
            creditor: Address {
                name: Some("Lea Simmen".into()),
                street: Some("Weinbergstrasse".into()),
                house_no: Some("31".into()),
                postal_code: Some("5502".into()),
                town: Some("Hunzenschwil".into()),
                country_code: Some("CH".into()),
            },
            final_creditor: Address::default(),
            currency: Some("CHF".into()),
            amount: Some(0.0),
            reference_no: Some(String::new()),
            additional_info: Some(String::new()),
            debtor: Address::default(),
            due_date: NaiveDate::from_ymd_opt(2018, 3, 31),
        }
    }

    /// Field tree holding this record's values.
    pub fn to_field_tree(&self) -> DomainResult<FieldTree> {
        FieldTree::builder()
            .leaf("account", self.account.clone())
            .group("creditor", |g| self.creditor.declare(g))
            .group("finalCreditor", |g| self.final_creditor.declare(g))
            .leaf("currency", self.currency.clone())
            .leaf("amount", self.amount)
            .leaf("referenceNo", self.reference_no.clone())
            .leaf("additionalInfo", self.additional_info.clone())
            .group("debtor", |g| self.debtor.declare(g))
            .leaf("dueDate", self.due_date)
            .build()
    }

    /// Synchronous rules of the bill data form.
    pub fn rules() -> DomainResult<RuleSet> {
        let country = || Rule::pattern("[A-Z]{2}");
        let mut rules = RuleSet::new();
        rules
            .add(
                FieldPath::parse("account")?,
                [Rule::Required, Rule::pattern("[A-Z0-9 ]{5,26}")?],
            )
            .add(FieldPath::parse("creditor.name")?, [Rule::Required])
            .add(
                FieldPath::parse("creditor.countryCode")?,
                [Rule::Required, country()?],
            )
            .add(FieldPath::parse("creditor.postalCode")?, [Rule::Required])
            .add(FieldPath::parse("creditor.town")?, [Rule::Required])
            .add(FieldPath::parse("finalCreditor.countryCode")?, [country()?])
            .add(
                FieldPath::parse("currency")?,
                [Rule::Required, Rule::pattern("[A-Z]{3}")?],
            )
            .add(
                FieldPath::parse("amount")?,
                [Rule::Required, Rule::range(AMOUNT_MIN, AMOUNT_MAX)],
            )
            .add(FieldPath::parse("debtor.countryCode")?, [country()?]);
        Ok(rules)
    }
}
