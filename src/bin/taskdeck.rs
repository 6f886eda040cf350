use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use taskdeck::auth::RegistrationForm;
use taskdeck::config::{TaskdeckConfig, DEFAULT_API_URL};
use taskdeck::prelude::*;

fn cli() -> Command<'static> {
    let id = || {
        Arg::new("id")
            .help("Task id")
            .required(true)
            .value_parser(value_parser!(i64))
    };
    let password = || {
        Arg::new("password")
            .long("password")
            .short('p')
            .env("TASKDECK_PASSWORD")
            .takes_value(true)
            .required(true)
            .value_parser(value_parser!(String))
    };

    Command::new("taskdeck")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Manage Taskdeck tasks from the terminal")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api_url")
                .long("api-url")
                .env("TASKDECK_API_URL")
                .takes_value(true)
                .default_value(DEFAULT_API_URL)
                .value_parser(value_parser!(String))
                .help("Base URL of the Taskdeck API"),
        )
        .arg(
            Arg::new("token_path")
                .long("token-path")
                .env("TASKDECK_TOKEN_PATH")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .help("File the session token is kept in"),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in")
                .arg(Arg::new("email").required(true).value_parser(value_parser!(String)))
                .arg(password()),
        )
        .subcommand(
            Command::new("register")
                .about("Create an account and sign in")
                .arg(Arg::new("email").required(true).value_parser(value_parser!(String)))
                .arg(password())
                .arg(
                    Arg::new("confirm")
                        .long("confirm")
                        .takes_value(true)
                        .required(true)
                        .value_parser(value_parser!(String))
                        .help("Repeat the password"),
                ),
        )
        .subcommand(Command::new("logout").about("Sign out and forget the stored token"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("list")
                .about("List tasks")
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .short('f')
                        .takes_value(true)
                        .default_value("all")
                        .value_parser(value_parser!(String))
                        .help("all, completed or pending"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print tasks as JSON"),
                ),
        )
        .subcommand(Command::new("show").about("Show one task").arg(id()))
        .subcommand(
            Command::new("add")
                .about("Create a task")
                .arg(Arg::new("title").required(true).value_parser(value_parser!(String)))
                .arg(
                    Arg::new("description")
                        .long("description")
                        .short('d')
                        .takes_value(true)
                        .value_parser(value_parser!(String)),
                ),
        )
        .subcommand(
            Command::new("edit")
                .about("Change a task's title or description")
                .arg(id())
                .arg(
                    Arg::new("title")
                        .long("title")
                        .takes_value(true)
                        .value_parser(value_parser!(String)),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .short('d')
                        .takes_value(true)
                        .value_parser(value_parser!(String)),
                ),
        )
        .subcommand(Command::new("toggle").about("Flip a task between done and pending").arg(id()))
        .subcommand(Command::new("delete").about("Delete a task").arg(id()))
        .subcommand(Command::new("stats").about("Count tasks by status"))
}

fn default_token_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskdeck")
        .join("session.json")
}

fn string_arg(matches: &ArgMatches, name: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing argument '{}'", name))
}

fn id_arg(matches: &ArgMatches) -> anyhow::Result<i64> {
    matches
        .get_one::<i64>("id")
        .copied()
        .context("missing task id")
}

fn print_task(task: &Task) {
    let mark = if task.is_completed { "x" } else { " " };
    println!("[{}] {:>5}  {}", mark, task.id, task.title);
}

fn print_details(task: &Task) {
    print_task(task);
    if let Some(description) = &task.description {
        println!("        {}", description);
    }
    println!("        created   {}", task.created_at.format("%Y-%m-%d %H:%M"));
    if let Some(completed_at) = task.completed_at {
        println!("        completed {}", completed_at.format("%Y-%m-%d %H:%M"));
    }
}

async fn require_session(client: &Taskdeck) -> anyhow::Result<()> {
    if !client.initialize().await.is_authenticated() {
        bail!("not signed in; run `taskdeck login <email>` first");
    }
    Ok(())
}

async fn run(matches: ArgMatches) -> anyhow::Result<()> {
    let api_url = string_arg(&matches, "api_url")?;
    let token_path = matches
        .get_one::<PathBuf>("token_path")
        .cloned()
        .unwrap_or_else(default_token_path);

    let config = TaskdeckConfig::new(&api_url)?
        .with_options(ClientOptions::default().with_token_path(token_path));
    let client = Taskdeck::from_config(config)?;

    match matches.subcommand() {
        Some(("login", sub)) => {
            client.initialize().await;
            let user = client
                .login(&string_arg(sub, "email")?, &string_arg(sub, "password")?)
                .await?;
            println!("Signed in as {}", user.email);
        }
        Some(("register", sub)) => {
            client.initialize().await;
            let form = RegistrationForm {
                email: string_arg(sub, "email")?,
                password: string_arg(sub, "password")?,
                confirm_password: string_arg(sub, "confirm")?,
            };
            let user = client.register(&form).await?;
            println!("Registered and signed in as {}", user.email);
        }
        Some(("logout", _)) => {
            client.logout().await;
            println!("Signed out");
        }
        Some(("whoami", _)) => {
            require_session(&client).await?;
            if let Some(user) = client.session().user() {
                println!("{} (id {})", user.email, user.id);
            }
        }
        Some(("list", sub)) => {
            let filter: TaskFilter = string_arg(sub, "filter")?.parse()?;
            require_session(&client).await?;
            client.tasks().list_tasks().await?;
            let tasks = client.tasks().filtered(filter);
            if sub.get_one::<bool>("json").copied().unwrap_or(false) {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No {} tasks", filter);
            } else {
                tasks.iter().for_each(print_task);
            }
        }
        Some(("show", sub)) => {
            require_session(&client).await?;
            let task = client.tasks().get_task(id_arg(sub)?).await?;
            print_details(&task);
        }
        Some(("add", sub)) => {
            require_session(&client).await?;
            let mut new_task = NewTask::new(string_arg(sub, "title")?);
            if let Some(description) = sub.get_one::<String>("description") {
                new_task = new_task.with_description(description.as_str());
            }
            let task = client.tasks().create_task(new_task).await?;
            print_task(&task);
        }
        Some(("edit", sub)) => {
            require_session(&client).await?;
            let mut update = TaskUpdate::new();
            if let Some(title) = sub.get_one::<String>("title") {
                update = update.title(title.as_str());
            }
            if let Some(description) = sub.get_one::<String>("description") {
                update = update.description(description.as_str());
            }
            if update.is_empty() {
                bail!("nothing to change; pass --title or --description");
            }
            let task = client.tasks().update_task(id_arg(sub)?, update).await?;
            print_details(&task);
        }
        Some(("toggle", sub)) => {
            require_session(&client).await?;
            let id = id_arg(sub)?;
            client.tasks().get_task(id).await?;
            let task = client.tasks().toggle_completion(id).await?;
            print_task(&task);
        }
        Some(("delete", sub)) => {
            require_session(&client).await?;
            let id = id_arg(sub)?;
            client.tasks().delete_task(id).await?;
            println!("Deleted task {}", id);
        }
        Some(("stats", _)) => {
            require_session(&client).await?;
            client.tasks().list_tasks().await?;
            let stats = client.tasks().stats();
            println!(
                "total {}  completed {}  pending {}",
                stats.total, stats.completed, stats.pending
            );
        }
        _ => unreachable!("subcommand_required prevents this"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    run(cli().get_matches()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn parses_list_filter() {
        let matches = cli()
            .try_get_matches_from(["taskdeck", "list", "--filter", "pending"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "list");
        assert_eq!(sub.get_one::<String>("filter").unwrap(), "pending");
    }

    #[test]
    fn rejects_non_numeric_id() {
        assert!(cli()
            .try_get_matches_from(["taskdeck", "delete", "forty-two"])
            .is_err());
    }
}
