use dataverse_http::{DataverseClient, DEFAULT_ACCOUNT_FIELDS};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = DataverseClient::from_env()?;
    let query = std::env::args().nth(1).unwrap_or_default();

    let accounts = client.search_accounts(&query, DEFAULT_ACCOUNT_FIELDS).await?;
    if accounts.is_empty() {
        println!("no accounts found");
        return Ok(());
    }

    for account in &accounts {
        println!(
            "{:<40} {:<20} {}",
            account.name.as_deref().unwrap_or("-"),
            account.telephone1.as_deref().unwrap_or("-"),
            account.emailaddress1.as_deref().unwrap_or("-"),
        );
    }

    if let Some(id) = accounts.first().and_then(|account| account.accountid.as_deref()) {
        let account = client.get_account_details(id).await?;
        println!();
        println!("{}", account.name.as_deref().unwrap_or("-"));
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_owned());
        println!("  primary contact:   {}", or_dash(account.primary_contact_name()));
        println!("  secondary contact: {}", or_dash(account.secondary_contact_name()));
        println!("  address:           {}", or_dash(account.formatted_address()));
        println!("  open:              {}", client.record_url("account", id));
    }

    Ok(())
}
