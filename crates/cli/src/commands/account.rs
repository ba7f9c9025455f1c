//! Sign-in and profile commands.

use nevyra_client::{NevyraClient, Result};
use nevyra_core::api::{ProfileUpdate, UserProfile};

use super::say;

pub async fn register(
    client: &NevyraClient,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> Result<()> {
    let user = client.session().register(email, password, name).await?;
    say(format!("Registered and signed in as {}", user.email));
    Ok(())
}

pub async fn login(client: &NevyraClient, email: &str, password: &str) -> Result<()> {
    let user = client.session().login(email, password).await?;
    say(format!("Signed in as {}", user.email));
    Ok(())
}

pub fn logout(client: &NevyraClient) -> Result<()> {
    client.session().logout()?;
    say("Signed out");
    Ok(())
}

/// Show the profile, updating it first when a field is given.
pub async fn profile(
    client: &NevyraClient,
    name: Option<String>,
    phone: Option<String>,
) -> Result<()> {
    let user = if name.is_some() || phone.is_some() {
        client
            .session()
            .update_profile(&ProfileUpdate { name, phone })
            .await?
    } else {
        client.session().profile().await?
    };
    print_profile(&user);
    Ok(())
}

fn print_profile(user: &UserProfile) {
    say(format!("Email: {}", user.email));
    say(format!("Name:  {}", user.name.as_deref().unwrap_or("-")));
    say(format!("Phone: {}", user.phone.as_deref().unwrap_or("-")));
    if user.is_admin {
        say("Role:  admin");
    }
}
