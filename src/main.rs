use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use tracing_subscriber::EnvFilter;
use xmltree::Element;

use allclients::{response, ApiClient, Config};

const USAGE: &str = "usage: allclients <command>

commands:
  add-contact <first> <last> [email]   Create a contact and print its ID
  get-contacts                         List contacts in the account
  list-flags                           List contact flags defined in the account
  list-todo-plans                      List to-do plans defined in the account
  new-contact <first> <last> [email] [--flag NAME]... [--todo-plan ID]
                                       Create a contact, then assign flags
                                       and a to-do plan";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::load_default()?;
    let zone = config.timezone()?;
    let client = ApiClient::with_timeout(
        &config.endpoint,
        &config.account_id,
        &config.api_key,
        config.timeout(),
    )?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("add-contact") => {
            let (first, last, email) = contact_args(&args[1..])?;
            add_contact(&client, first, last, email).await?;
        }
        Some("get-contacts") => get_contacts(&client, zone).await?,
        Some("list-flags") => list_flags(&client).await?,
        Some("list-todo-plans") => list_todo_plans(&client).await?,
        Some("new-contact") => new_contact(&client, &args[1..]).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
    Ok(())
}

/// Invokes an API method and applies the standard response check: transport
/// and parse failures surface from `invoke`, business-level failures from the
/// document's `<error>` element.
async fn call(client: &ApiClient, method: &str, params: &[(&str, &str)]) -> Result<Element> {
    let document = client.invoke(method, params).await?;
    response::check(&document)?;
    Ok(document)
}

/// Creates a contact via `AddContact` and returns the new contact ID.
async fn add_contact(
    client: &ApiClient,
    first: &str,
    last: &str,
    email: Option<&str>,
) -> Result<i64> {
    let mut params = vec![("firstname", first), ("lastname", last)];
    if let Some(email) = email {
        params.push(("email", email));
    }

    let document = call(client, "AddContact", &params).await?;
    let contact_id = response::contact_id(&document)?;
    println!("Added contact with contactid {contact_id}");
    Ok(contact_id)
}

/// Lists contacts, one line per contact: `Last, First (id), updated MM/DD/YYYY`.
async fn get_contacts(client: &ApiClient, zone: Tz) -> Result<()> {
    let document = call(client, "GetContacts", &[]).await?;
    let contacts = response::contacts(&document, zone)?;

    if contacts.is_empty() {
        println!("No contacts returned!");
        return Ok(());
    }

    println!("Contacts returned: {}", contacts.len());
    for contact in contacts {
        println!(
            "{}, {} ({}), updated {}",
            contact.last_name,
            contact.first_name,
            contact.id,
            contact.edit_date.format("%m/%d/%Y")
        );
    }
    Ok(())
}

async fn list_flags(client: &ApiClient) -> Result<()> {
    let document = call(client, "GetFlags", &[]).await?;
    for flag in response::flags(&document)? {
        println!("{}: {}", flag.flag_id, flag.name);
    }
    Ok(())
}

async fn list_todo_plans(client: &ApiClient) -> Result<()> {
    let document = call(client, "GetToDoPlans", &[]).await?;
    for plan in response::todo_plans(&document)? {
        println!("{}: {}", plan.id, plan.name);
    }
    Ok(())
}

/// Creates a contact, then assigns the requested flags and to-do plan.
///
/// A failed flag or plan assignment is reported and does not abort the
/// remaining steps, but the command still exits nonzero if any step failed.
async fn new_contact(client: &ApiClient, args: &[String]) -> Result<()> {
    let request = NewContactArgs::parse(args)?;

    // Fetch the defined flags and plans up front, as the form does, so we
    // can reject names and IDs the account doesn't know about.
    let flags_document = call(client, "GetFlags", &[]).await?;
    let known_flags = response::flags(&flags_document)?;
    let plans_document = call(client, "GetToDoPlans", &[]).await?;
    let known_plans = response::todo_plans(&plans_document)?;

    let contact_id = add_contact(
        client,
        &request.first_name,
        &request.last_name,
        request.email.as_deref(),
    )
    .await?;
    let identify_value = contact_id.to_string();

    let mut failed = false;
    for flag_name in &request.flags {
        if !known_flags.iter().any(|flag| &flag.name == flag_name) {
            eprintln!("Flag '{flag_name}' is not defined in this account");
            failed = true;
            continue;
        }

        // mode 1 adds the flag; identifymethod 1 identifies by contact ID.
        let params = [
            ("mode", "1"),
            ("identifymethod", "1"),
            ("identifyvalue", identify_value.as_str()),
            ("flag", flag_name.as_str()),
        ];
        match call(client, "ContactFlags", &params).await {
            Ok(_) => println!("Added contact flag '{flag_name}'"),
            Err(error) => {
                eprintln!("Error adding flag '{flag_name}': {error}");
                failed = true;
            }
        }
    }

    if let Some(plan_id) = request.todo_plan {
        match known_plans.iter().find(|plan| plan.id == plan_id) {
            None => {
                eprintln!("To-do plan {plan_id} is not defined in this account");
                failed = true;
            }
            Some(plan) => {
                let plan_id_value = plan_id.to_string();
                let params = [
                    ("identifymethod", "1"),
                    ("identifyvalue", identify_value.as_str()),
                    ("todoplanid", plan_id_value.as_str()),
                ];
                match call(client, "AssignToDoPlan", &params).await {
                    Ok(_) => println!("Assigned to-do plan '{}', ID {plan_id}", plan.name),
                    Err(error) => {
                        eprintln!(
                            "Error assigning to-do plan '{}', ID {plan_id}: {error}",
                            plan.name
                        );
                        failed = true;
                    }
                }
            }
        }
    }

    if failed {
        bail!("one or more assignment steps failed");
    }
    Ok(())
}

/// Positional first/last name with an optional trailing email.
fn contact_args(args: &[String]) -> Result<(&str, &str, Option<&str>)> {
    match args {
        [first, last] => Ok((first.as_str(), last.as_str(), None)),
        [first, last, email] => Ok((first.as_str(), last.as_str(), Some(email.as_str()))),
        _ => bail!("expected: <first> <last> [email]"),
    }
}

struct NewContactArgs {
    first_name: String,
    last_name: String,
    email: Option<String>,
    flags: Vec<String>,
    todo_plan: Option<i64>,
}

impl NewContactArgs {
    fn parse(args: &[String]) -> Result<Self> {
        let mut positional = Vec::new();
        let mut flags = Vec::new();
        let mut todo_plan = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--flag" => {
                    let name = iter.next().context("--flag requires a flag name")?;
                    flags.push(name.clone());
                }
                "--todo-plan" => {
                    let id = iter.next().context("--todo-plan requires a plan ID")?;
                    todo_plan = Some(id.parse().context("--todo-plan ID must be an integer")?);
                }
                _ => positional.push(arg.clone()),
            }
        }

        let (first_name, last_name, email) = match positional.as_slice() {
            [first, last] => (first.clone(), last.clone(), None),
            [first, last, email] => (first.clone(), last.clone(), Some(email.clone())),
            _ => bail!("expected: <first> <last> [email] [--flag NAME]... [--todo-plan ID]"),
        };
        // AddContact rejects contacts without names; fail before calling out.
        if first_name.is_empty() || last_name.is_empty() {
            bail!("first and last name must not be empty");
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            flags,
            todo_plan,
        })
    }
}
