//! OData endpoint builders for the account and contact operations.
//!
//! Pure string functions so they can be tested without a server.

use crate::{DataverseError, Result};

/// Fields returned by [`search_accounts`](crate::DataverseClient::search_accounts)
/// when the caller has no projection of its own.
pub const DEFAULT_ACCOUNT_FIELDS: &[&str] = &["name", "accountid", "telephone1", "emailaddress1"];

/// Fields selected by [`account_details_endpoint`].
pub const ACCOUNT_DETAIL_FIELDS: &[&str] = &[
    "name",
    "accountid",
    "telephone1",
    "emailaddress1",
    "websiteurl",
    "address1_line1",
    "address1_city",
    "address1_stateorprovince",
    "address1_postalcode",
    "address1_country",
];

/// Related contact lookups expanded on account details.
pub const ACCOUNT_CONTACT_LOOKUPS: &[&str] = &["primarycontactid", "t4a_secondarycontactid"];

/// `$filter` clause matching accounts whose name contains `query`.
///
/// Returns `None` for an empty or whitespace-only query. The query is trimmed,
/// single quotes are doubled as OData string literals require, and the
/// literal is percent-encoded for the query string.
pub fn name_contains_filter(query: &str) -> Option<String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }
    let literal = trimmed.replace('\'', "''");
    Some(format!(
        "$filter=contains(name,'{}')",
        urlencoding::encode(&literal)
    ))
}

/// Endpoint listing accounts, filtered by name when `query` is non-blank.
pub fn account_search_endpoint<S: AsRef<str>>(query: &str, fields: &[S]) -> String {
    let select = join_fields(fields);
    match name_contains_filter(query) {
        Some(filter) => format!("accounts?{filter}&$select={select}"),
        None => format!("accounts?$select={select}"),
    }
}

/// Endpoint for one account with detail fields and both contact lookups expanded.
pub fn account_details_endpoint(account_id: &str) -> Result<String> {
    let account_id = record_id(account_id)?;
    let expand = ACCOUNT_CONTACT_LOOKUPS
        .iter()
        .map(|lookup| format!("{lookup}($select=firstname,lastname)"))
        .collect::<Vec<_>>()
        .join(",");
    Ok(format!(
        "accounts({account_id})?$select={}&$expand={expand}",
        ACCOUNT_DETAIL_FIELDS.join(",")
    ))
}

/// Endpoint reading the parent customer reference of one contact.
pub fn contact_details_endpoint(contact_id: &str) -> Result<String> {
    let contact_id = record_id(contact_id)?;
    Ok(format!("contacts({contact_id})?$select=_parentcustomerid_value"))
}

/// Checks that `id` is a GUID (`8-4-4-4-12` hex digits, braces allowed) and
/// returns it without braces or surrounding whitespace.
///
/// Anything else would be spliced into the resource path unescaped.
pub fn record_id(id: &str) -> Result<&str> {
    let trimmed = id.trim();
    let bare = trimmed
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .unwrap_or(trimmed);
    let groups = bare.split('-').map(str::len).collect::<Vec<_>>();
    let well_formed = groups == [8, 4, 4, 4, 12]
        && bare.chars().all(|c| c == '-' || c.is_ascii_hexdigit());
    if well_formed {
        Ok(bare)
    } else {
        Err(DataverseError::Config(format!("record id must be a GUID, got '{trimmed}'")))
    }
}

fn join_fields<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| field.as_ref().trim())
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_has_no_filter() {
        assert_eq!(name_contains_filter(""), None);
        assert_eq!(name_contains_filter("   \t"), None);
        assert_eq!(
            account_search_endpoint("", DEFAULT_ACCOUNT_FIELDS),
            "accounts?$select=name,accountid,telephone1,emailaddress1"
        );
    }

    #[test]
    fn query_becomes_contains_filter() {
        assert_eq!(
            account_search_endpoint("Acme", &["name", "accountid"]),
            "accounts?$filter=contains(name,'Acme')&$select=name,accountid"
        );
    }

    #[test]
    fn query_is_trimmed_and_percent_encoded() {
        assert_eq!(
            name_contains_filter("  Fourth Coffee & Co ").as_deref(),
            Some("$filter=contains(name,'Fourth%20Coffee%20%26%20Co')")
        );
    }

    #[test]
    fn single_quotes_are_doubled_before_encoding() {
        assert_eq!(
            name_contains_filter("O'Brien").as_deref(),
            Some("$filter=contains(name,'O%27%27Brien')")
        );
    }

    const ACCOUNT_ID: &str = "00000000-0000-0000-0000-000000000001";

    #[test]
    fn details_endpoint_expands_both_contacts() {
        let endpoint = account_details_endpoint(ACCOUNT_ID).expect("valid id");
        assert!(endpoint.starts_with(
            "accounts(00000000-0000-0000-0000-000000000001)?$select=name,accountid,"
        ));
        assert!(endpoint.ends_with(
            "&$expand=primarycontactid($select=firstname,lastname),\
             t4a_secondarycontactid($select=firstname,lastname)"
        ));
    }

    #[test]
    fn contact_endpoint_selects_parent_customer() {
        assert_eq!(
            contact_details_endpoint(" {5B3E0C4A-9F1D-4E2B-8A7C-0D6E5F4A3B2C} ")
                .expect("braced guid is valid"),
            "contacts(5B3E0C4A-9F1D-4E2B-8A7C-0D6E5F4A3B2C)?$select=_parentcustomerid_value"
        );
    }

    #[test]
    fn ids_that_would_alter_the_path_are_rejected() {
        for id in [
            "a1",
            "",
            "x)?$select=fullname&a=(",
            "00000000-0000-0000-0000-00000000000g",
        ] {
            assert!(
                matches!(record_id(id), Err(crate::DataverseError::Config(_))),
                "{id:?} must be rejected"
            );
        }
        assert!(account_details_endpoint("1)?$top=1").is_err());
    }
}
