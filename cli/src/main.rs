use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use freelancehub::net::credentials::{CookieCredentials, CredentialSource};
use freelancehub::net::types::{ApplicationStatus, Category, Decision, ExperienceLevel, ProfileUpdate, Role, format_budget};
use freelancehub::pages::auth::{self, RegisterForm};
use freelancehub::pages::job_detail::{ApplyPanel, JobDetail};
use freelancehub::pages::job_list::{JobList, parse_filter};
use freelancehub::pages::my_applications::MyApplications;
use freelancehub::pages::my_jobs::MyJobs;
use freelancehub::pages::nav::{Account, home_actions, nav_bar};
use freelancehub::pages::post_job::{JobForm, POST_JOB_SUCCEEDED, PostJob};
use freelancehub::pages::profile::Profile;
use freelancehub::pages::{Gated, PageError};
use freelancehub::{ApiError, App, ClientConfig, ConfigError};
use serde_json::Value;
use tracing_subscriber::EnvFilter;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Page(#[from] PageError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "freelancehub", about = "FreelanceHub marketplace client")]
struct Cli {
    /// Overrides FREELANCEHUB_API_BASE_URL / FREELANCEHUB_ENV.
    #[arg(long)]
    base_url: Option<String>,

    /// Session cookie printed by `login`.
    #[arg(long, env = "FREELANCEHUB_SESSION_ID")]
    session_id: Option<String>,

    /// Anti-forgery cookie printed by `login`.
    #[arg(long, env = "FREELANCEHUB_CSRF_TOKEN")]
    csrf_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Navigation and home actions for the current session.
    Nav,
    Whoami,
    Register(RegisterArgs),
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "FREELANCEHUB_PASSWORD")]
        password: String,
    },
    Logout,
    Jobs(JobsCommand),
    /// Applications you submitted (freelancers).
    Applications,
    Profile(ProfileCommand),
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "FREELANCEHUB_PASSWORD")]
    password: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, value_enum, default_value_t = RoleArg::Freelancer)]
    role: RoleArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Freelancer,
    Client,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Freelancer => Self::Freelancer,
            RoleArg::Client => Self::Client,
        }
    }
}

#[derive(Args, Debug)]
struct JobsCommand {
    #[command(subcommand)]
    command: JobsSubcommand,
}

#[derive(Subcommand, Debug)]
enum JobsSubcommand {
    List {
        #[arg(long, default_value = "all")]
        category: String,
    },
    Show {
        job_id: u64,
    },
    Post(PostArgs),
    Apply {
        job_id: u64,
        #[arg(long)]
        cover_letter: String,
        #[arg(long, default_value = "")]
        bid: String,
    },
    /// Jobs you posted with their applications (clients).
    Mine,
    Decide {
        application_id: u64,
        #[arg(value_enum)]
        decision: DecisionArg,
    },
}

#[derive(Args, Debug)]
struct PostArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: String,
    #[arg(long, default_value = "web-development")]
    category: String,
    #[arg(long, default_value = "entry")]
    experience_level: String,
    #[arg(long, default_value = "")]
    budget: String,
    #[arg(long, default_value_t = false)]
    hourly: bool,
    #[arg(long, default_value = "")]
    deadline: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DecisionArg {
    Accept,
    Reject,
}

impl From<DecisionArg> for Decision {
    fn from(decision: DecisionArg) -> Self {
        match decision {
            DecisionArg::Accept => Self::Accepted,
            DecisionArg::Reject => Self::Rejected,
        }
    }
}

#[derive(Args, Debug)]
struct ProfileCommand {
    #[command(subcommand)]
    command: ProfileSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfileSubcommand {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(error) = dotenvy::dotenv() {
        if !error.not_found() {
            eprintln!("ignoring unreadable .env: {error}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let app = build_app(&cli)?;
    app.start().await;

    match cli.command {
        Command::Nav => run_nav(&app),
        Command::Whoami => run_whoami(&app),
        Command::Register(args) => run_register(&app, args).await,
        Command::Login { username, password } => run_login(&app, &username, &password).await,
        Command::Logout => {
            auth::logout(&app).await;
            println!("unset FREELANCEHUB_SESSION_ID");
            Ok(())
        }
        Command::Jobs(jobs) => run_jobs(&app, jobs).await,
        Command::Applications => run_applications(&app).await,
        Command::Profile(profile) => run_profile(&app, profile).await,
    }
}

fn build_app(cli: &Cli) -> Result<App, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = ClientConfig { base_url: ClientConfig::new(base_url).base_url, ..config };
    }
    let mut credentials = CookieCredentials::new(&config.session_cookie, &config.csrf_cookie);
    if let Some(session_id) = &cli.session_id {
        credentials = credentials.with_session(session_id);
    }
    if let Some(token) = &cli.csrf_token {
        credentials = credentials.with_anti_forgery(token);
    }
    Ok(App::new(config, Arc::new(credentials))?)
}

fn run_nav(app: &App) -> Result<(), CliError> {
    let gate = app.gate();
    let bar = nav_bar(&gate);
    let menu: Vec<&str> = bar.menu.iter().map(|link| link.label()).collect();
    println!("{}", menu.join(" | "));
    match &bar.account {
        Account::SignedIn { greeting } => println!("{greeting}"),
        Account::Anonymous | Account::Pending => {}
    }
    let links: Vec<&str> = bar.account_links().iter().map(|link| link.label()).collect();
    if !links.is_empty() {
        println!("{}", links.join(" | "));
    }
    let actions: Vec<&str> = home_actions(&gate).iter().map(|(label, _)| *label).collect();
    println!("home: {}", actions.join(" | "));
    Ok(())
}

fn run_whoami(app: &App) -> Result<(), CliError> {
    match app.gate().identity() {
        Some(identity) => print_json(&serde_json::to_value(identity)?),
        None => {
            println!("anonymous");
            Ok(())
        }
    }
}

async fn run_register(app: &App, args: RegisterArgs) -> Result<(), CliError> {
    let form = RegisterForm {
        username: args.username,
        email: args.email,
        password: args.password,
        first_name: args.first_name,
        last_name: args.last_name,
        role: args.role.into(),
    };
    let identity = auth::register(app, &form).await?;
    eprintln!("{}", register_notice(&identity.username, identity.role));
    Ok(())
}

async fn run_login(app: &App, username: &str, password: &str) -> Result<(), CliError> {
    let identity = auth::login(app, username, password).await?;
    print_exports(app.credentials().as_ref());
    eprintln!("{}", nav_greeting(app).unwrap_or_else(|| format!("logged in as {}", identity.username)));
    Ok(())
}

/// Registration opens no server session, so the account is only usable in
/// later runs after a login.
fn register_notice(username: &str, role: Role) -> String {
    format!("registered {username} as {role}; run `freelancehub login --username {username}` to start a session")
}

fn nav_greeting(app: &App) -> Option<String> {
    match nav_bar(&app.gate()).account {
        Account::SignedIn { greeting } => Some(greeting),
        Account::Anonymous | Account::Pending => None,
    }
}

/// Shell lines that carry the session into the next invocation.
fn export_lines(credentials: &dyn CredentialSource) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(session) = credentials.session_cookie() {
        lines.push(format!("export FREELANCEHUB_SESSION_ID={session}"));
    }
    if let Some(token) = credentials.anti_forgery_token() {
        lines.push(format!("export FREELANCEHUB_CSRF_TOKEN={token}"));
    }
    lines
}

fn print_exports(credentials: &dyn CredentialSource) {
    for line in export_lines(credentials) {
        println!("{line}");
    }
}

async fn run_jobs(app: &App, jobs: JobsCommand) -> Result<(), CliError> {
    match jobs.command {
        JobsSubcommand::List { category } => {
            let page = JobList::new(app);
            page.select(parse_filter(&category)?).await;
            let view = page.view();
            if let Some(error) = view.error {
                return Err(PageError::Failed(error).into());
            }
            for job in &view.jobs {
                println!(
                    "#{:<5} {:<40} {:<20} {:>12}  by {}",
                    job.id,
                    job.title,
                    job.category,
                    format_budget(job.budget),
                    job.client.username
                );
            }
            Ok(())
        }
        JobsSubcommand::Show { job_id } => {
            let page = JobDetail::new(app, job_id);
            page.load().await;
            let view = page.view();
            if let Some(error) = view.error {
                return Err(PageError::Failed(error).into());
            }
            if let Some(job) = &view.job {
                print_json(&serde_json::to_value(job)?)?;
            }
            match page.panel() {
                ApplyPanel::Form { .. } => println!("apply with: freelancehub jobs apply {job_id} --cover-letter ..."),
                ApplyPanel::Owner(message) | ApplyPanel::Submitted(message) | ApplyPanel::LoginPrompt(message) => {
                    println!("{message}");
                }
                ApplyPanel::Loading => {}
            }
            Ok(())
        }
        JobsSubcommand::Post(args) => {
            let form = post_form(args)?;
            let job = PostJob::new(app).submit(&form).await?;
            eprintln!("{POST_JOB_SUCCEEDED}");
            print_json(&serde_json::to_value(&job)?)
        }
        JobsSubcommand::Apply { job_id, cover_letter, bid } => {
            let page = JobDetail::new(app, job_id);
            page.load().await;
            page.apply(&cover_letter, &bid).await?;
            if let ApplyPanel::Submitted(message) = page.panel() {
                println!("{message}");
            }
            Ok(())
        }
        JobsSubcommand::Mine => {
            let page = MyJobs::new(app);
            page.load().await?;
            let Gated::Ready(view) = page.view() else {
                return Err(CliError::Unavailable("my jobs are not available for this session"));
            };
            for job in &view.jobs {
                println!("#{:<5} {}  ({})", job.id, job.title, format_budget(job.budget));
                for application in view.applications_for(job.id) {
                    println!(
                        "    application #{:<5} {:<20} {:<9} bid {}",
                        application.id,
                        application.freelancer.username,
                        application.status.label(),
                        format_budget(application.bid_amount)
                    );
                }
            }
            Ok(())
        }
        JobsSubcommand::Decide { application_id, decision } => {
            let page = MyJobs::new(app);
            page.load().await?;
            page.decide(application_id, decision.into()).await?;
            println!("application #{application_id} {}", ApplicationStatus::from(Decision::from(decision)).as_str());
            Ok(())
        }
    }
}

fn post_form(args: PostArgs) -> Result<JobForm, CliError> {
    let category = Category::from_slug(&args.category)
        .ok_or_else(|| PageError::Validation(format!("Unknown category: {}", args.category)))?;
    let experience_level = ExperienceLevel::from_slug(&args.experience_level)
        .ok_or_else(|| PageError::Validation(format!("Unknown experience level: {}", args.experience_level)))?;
    Ok(JobForm {
        title: args.title,
        description: args.description,
        category,
        experience_level,
        is_fixed_price: !args.hourly,
        budget: args.budget,
        deadline: args.deadline,
    })
}

async fn run_applications(app: &App) -> Result<(), CliError> {
    let page = MyApplications::new(app);
    page.load().await?;
    let Gated::Ready(view) = page.view() else {
        return Err(CliError::Unavailable("applications are not available for this session"));
    };
    for application in &view.applications {
        println!(
            "#{:<5} {:<40} {:<9} bid {}",
            application.id,
            application.job.title,
            application.status.label(),
            format_budget(application.bid_amount)
        );
    }
    Ok(())
}

async fn run_profile(app: &App, profile: ProfileCommand) -> Result<(), CliError> {
    let page = Profile::new(app);
    match profile.command {
        ProfileSubcommand::Show => match page.view() {
            Gated::Ready(identity) => print_json(&serde_json::to_value(identity)?),
            Gated::Denied(message) => Err(PageError::Denied(message).into()),
            Gated::Loading => Err(CliError::Unavailable("session is still resolving")),
        },
        ProfileSubcommand::Update { first_name, last_name, email, bio } => {
            let update = ProfileUpdate { first_name, last_name, email, bio };
            let identity = page.update(&update).await?;
            print_json(&serde_json::to_value(identity)?)
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
