use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// OData collection envelope: `{"value": [...]}`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EntityCollection<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink", default)]
    pub next_link: Option<String>,
}

/// Expanded contact lookup on an account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactName {
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

impl ContactName {
    /// `"first last"` trimmed, or `None` when both parts are empty.
    pub fn display_name(&self) -> Option<String> {
        let full = format!(
            "{} {}",
            self.firstname.as_deref().unwrap_or_default(),
            self.lastname.as_deref().unwrap_or_default()
        );
        let full = full.trim();
        (!full.is_empty()).then(|| full.to_owned())
    }
}

/// Account record. Every field is optional since searches project a subset.
///
/// Fields outside the known set (custom projections, OData annotations) are
/// kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub accountid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub telephone1: Option<String>,
    #[serde(default)]
    pub emailaddress1: Option<String>,
    #[serde(default)]
    pub websiteurl: Option<String>,
    #[serde(default)]
    pub address1_line1: Option<String>,
    #[serde(default)]
    pub address1_city: Option<String>,
    #[serde(default)]
    pub address1_stateorprovince: Option<String>,
    #[serde(default)]
    pub address1_postalcode: Option<String>,
    #[serde(default)]
    pub address1_country: Option<String>,
    #[serde(default)]
    pub primarycontactid: Option<ContactName>,
    #[serde(default)]
    pub t4a_secondarycontactid: Option<ContactName>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Account {
    /// Non-empty address parts joined with `", "`.
    pub fn formatted_address(&self) -> Option<String> {
        let parts = [
            &self.address1_line1,
            &self.address1_city,
            &self.address1_stateorprovince,
            &self.address1_postalcode,
            &self.address1_country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>();
        (!parts.is_empty()).then(|| parts.join(", "))
    }

    pub fn primary_contact_name(&self) -> Option<String> {
        self.primarycontactid.as_ref()?.display_name()
    }

    pub fn secondary_contact_name(&self) -> Option<String> {
        self.t4a_secondarycontactid.as_ref()?.display_name()
    }
}

/// Contact reference fields used to route a contact to its account.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub contactid: Option<String>,
    /// Owning account (or contact) id from `_parentcustomerid_value`.
    #[serde(rename = "_parentcustomerid_value", default)]
    pub parent_customer_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Account, ContactDetails, ContactName, EntityCollection};

    #[test]
    fn account_keeps_unknown_fields_in_extra() {
        let account: Account = serde_json::from_value(json!({
            "@odata.etag": "W/\"123\"",
            "accountid": "a1",
            "name": "Acme",
            "revenue": 10.5
        }))
        .expect("account must decode");

        assert_eq!(account.name.as_deref(), Some("Acme"));
        assert_eq!(account.extra["revenue"], json!(10.5));
        assert!(account.extra.contains_key("@odata.etag"));
    }

    #[test]
    fn formatted_address_skips_missing_parts() {
        let account = Account {
            address1_line1: Some("1 Main St".to_owned()),
            address1_city: Some("Leeds".to_owned()),
            address1_postalcode: Some("".to_owned()),
            address1_country: Some("UK".to_owned()),
            ..Account::default()
        };
        assert_eq!(
            account.formatted_address().as_deref(),
            Some("1 Main St, Leeds, UK")
        );
        assert_eq!(Account::default().formatted_address(), None);
    }

    #[test]
    fn contact_display_name_trims_missing_parts() {
        let only_last = ContactName {
            firstname: None,
            lastname: Some("Smith".to_owned()),
        };
        assert_eq!(only_last.display_name().as_deref(), Some("Smith"));
        assert_eq!(ContactName::default().display_name(), None);
    }

    #[test]
    fn null_lookups_decode_as_none() {
        let account: Account = serde_json::from_value(json!({
            "name": "Acme",
            "primarycontactid": null
        }))
        .expect("account must decode");
        assert_eq!(account.primary_contact_name(), None);
    }

    #[test]
    fn contact_details_maps_parent_customer_value() {
        let contact: ContactDetails = serde_json::from_value(json!({
            "@odata.etag": "W/\"1\"",
            "contactid": "c1",
            "_parentcustomerid_value": "a1"
        }))
        .expect("contact must decode");
        assert_eq!(contact.parent_customer_id.as_deref(), Some("a1"));
    }

    #[test]
    fn collection_reads_value_list() {
        let page: EntityCollection<Account> =
            serde_json::from_value(json!({"value": [{"name": "A"}, {"name": "B"}]}))
                .expect("collection must decode");
        assert_eq!(page.value.len(), 2);
        assert_eq!(page.next_link, None);
    }
}
