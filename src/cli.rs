use crate::core::{
    ContextPolicyKind, DEFAULT_MAX_ITEMS, DEFAULT_MODEL, DEFAULT_TOPIC, DurationBound,
    GenerationConfig, InjectFailurePolicy, ModelConfig, ResultKind, SearchCriteria, SearchFilter,
    Settings, SortOrder, UploadDate, context_policy, model_config, parse_languages,
};
use crate::error::Result;
use clap::builder::TypedValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "vidigest")]
#[command(about = "Digest recent videos on a topic into a Buy/Sell/Hold summary")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `run` command
    #[command(flatten)]
    pub run: RunArgs,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover, fetch and analyze videos (default)
    Run(RunArgs),

    /// Only list the videos a run would analyze
    Search(SearchArgs),

    /// Print the transcript of a single video
    Transcript {
        /// YouTube video URL or video ID
        video: String,

        /// Preferred languages (comma-separated)
        #[arg(short, long, default_value = "en")]
        languages: String,
    },
}

#[derive(Args, Clone, Debug)]
pub struct SearchArgs {
    /// Search topic
    #[arg(short, long, env = "VIDIGEST_TOPIC", default_value = DEFAULT_TOPIC)]
    pub topic: String,

    /// Maximum number of videos
    #[arg(
        short = 'n',
        long,
        env = "VIDIGEST_MAX_ITEMS",
        default_value_t = DEFAULT_MAX_ITEMS,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from),
    )]
    pub max_items: usize,

    /// Result ordering
    #[arg(long, value_enum, default_value_t = SortOrder::ViewCount)]
    pub sort: SortOrder,

    /// Upload recency
    #[arg(long, value_enum, default_value_t = UploadDate::Today)]
    pub upload_date: UploadDate,

    /// Result kind
    #[arg(long, value_enum, default_value_t = ResultKind::Video)]
    pub kind: ResultKind,

    /// Video length
    #[arg(long, value_enum, default_value_t = DurationBound::Medium)]
    pub duration: DurationBound,

    /// Pre-encoded filter token; overrides the criteria flags above
    #[arg(long, env = "VIDIGEST_FILTER")]
    pub filter: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub search: SearchArgs,

    /// Preferred transcript languages (comma-separated)
    #[arg(short, long, env = "VIDIGEST_LANGUAGES", default_value = "en")]
    pub languages: String,

    /// Model name
    #[arg(short, long, env = "VIDIGEST_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    #[arg(long, default_value_t = 0.5)]
    pub temperature: f32,

    #[arg(long, default_value_t = 0.8)]
    pub top_p: f32,

    /// Top-k sampling; the OpenAI Responses backend ignores this value
    #[arg(long, default_value_t = 30)]
    pub top_k: u32,

    #[arg(long, default_value_t = 8192)]
    pub max_output_tokens: u32,

    /// Which part of the conversation is sent with each request
    #[arg(long, value_enum, default_value_t = ContextPolicyKind::Unbounded)]
    pub context_policy: ContextPolicyKind,

    /// Turns (sliding-window) or characters (char-budget) to keep
    #[arg(long)]
    pub context_limit: Option<usize>,

    /// Leave out a video whose analysis request fails instead of aborting
    #[arg(long)]
    pub skip_failed_injections: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Open the result in the interactive viewer
    #[arg(long)]
    pub tui: bool,
}

impl SearchArgs {
    pub fn filter(&self) -> SearchFilter {
        match &self.filter {
            Some(token) => SearchFilter::Encoded(token.clone()),
            None => SearchFilter::Criteria(SearchCriteria {
                sort: self.sort,
                upload_date: self.upload_date,
                kind: self.kind,
                duration: self.duration,
            }),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings {
            topic: self.topic.trim().to_string(),
            max_items: self.max_items,
            filter: self.filter(),
            ..Settings::default()
        }
        .validate()
    }
}

impl RunArgs {
    pub fn inject_failure(&self) -> InjectFailurePolicy {
        if self.skip_failed_injections {
            InjectFailurePolicy::Skip
        } else {
            InjectFailurePolicy::Abort
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings {
            languages: parse_languages(&self.languages),
            context_policy: context_policy(self.context_policy, self.context_limit)?,
            inject_failure: self.inject_failure(),
            ..self.search.settings()?
        }
        .validate()
    }

    pub fn model_config(&self) -> Result<ModelConfig> {
        model_config(
            self.model.clone(),
            self.api_key.clone(),
            self.api_base.clone(),
            GenerationConfig {
                temperature: self.temperature,
                top_p: self.top_p,
                top_k: Some(self.top_k),
                max_output_tokens: self.max_output_tokens,
            },
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["vidigest"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn top_level_flags_feed_the_default_run() {
        let cli = Cli::try_parse_from(["vidigest", "--topic", "eth", "--format", "json"])
            .expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.run.search.topic, "eth");
        assert_eq!(cli.run.format, OutputFormat::Json);
    }

    #[test]
    fn criteria_flags_build_the_filter() {
        let cli = Cli::try_parse_from([
            "vidigest",
            "search",
            "--sort",
            "upload-date",
            "--upload-date",
            "any",
            "--kind",
            "any",
            "--duration",
            "any",
        ])
        .expect("parse");
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.filter().token().as_deref(), Some("CAI="));

        let settings = args.settings().expect("settings");
        assert_eq!(settings.filter.recency(), "recently");
    }

    #[test]
    fn encoded_filter_overrides_criteria() {
        let cli =
            Cli::try_parse_from(["vidigest", "search", "--filter", "EgIQAQ=="]).expect("parse");
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.filter(), SearchFilter::Encoded("EgIQAQ==".into()));
    }

    #[test]
    fn run_settings_resolve_policies() {
        let cli = Cli::try_parse_from([
            "vidigest",
            "run",
            "--languages",
            "en,es",
            "--context-policy",
            "char-budget",
            "--context-limit",
            "20000",
        ])
        .expect("parse");
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        let settings = args.settings().expect("settings");
        assert_eq!(settings.languages, ["en", "es"]);
        assert_eq!(
            settings.context_policy,
            crate::core::ContextPolicy::CharBudget { chars: 20000 }
        );
        assert_eq!(settings.inject_failure, InjectFailurePolicy::Abort);
    }

    #[test]
    fn bounded_policy_without_limit_is_a_config_error() {
        let cli = Cli::try_parse_from(["vidigest", "run", "--context-policy", "sliding-window"])
            .expect("parse");
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert!(args.settings().is_err());
    }

    #[test]
    fn run_flags() {
        let cli = Cli::try_parse_from([
            "vidigest",
            "run",
            "-vv",
            "--topic",
            "solana",
            "-n",
            "5",
            "--upload-date",
            "this-week",
            "--context-policy",
            "sliding-window",
            "--context-limit",
            "6",
            "--skip-failed-injections",
        ])
        .expect("parse");

        assert_eq!(cli.verbose, 2);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.search.topic, "solana");
        assert_eq!(args.search.max_items, 5);
        assert_eq!(args.search.upload_date, UploadDate::ThisWeek);
        assert_eq!(args.context_policy, ContextPolicyKind::SlidingWindow);
        assert_eq!(args.context_limit, Some(6));
        assert_eq!(args.inject_failure(), InjectFailurePolicy::Skip);
    }

    #[test]
    fn top_k_help_says_it_is_ignored() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let run = cmd.find_subcommand_mut("run").expect("run subcommand");
        let help = run.render_long_help().to_string();
        assert!(help.contains("--top-k"));
        assert!(help.contains("backend ignores this value"));
    }

    #[test]
    fn max_items_is_parsed_as_a_count() {
        let cli = Cli::try_parse_from(["vidigest", "search", "-n", "7"]).expect("parse");
        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search");
        };
        assert_eq!(args.max_items, 7usize);
    }

    #[test]
    fn zero_items_is_rejected() {
        assert!(Cli::try_parse_from(["vidigest", "search", "-n", "0"]).is_err());
    }
}
