use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use socialdash::config::{OutputFormat, RenderOptions, SessionFile};
use socialdash::dashboard::{write_charts, Dashboard};
use socialdash::loader::DataLoader;
use socialdash::parser::parse_graph;
use socialdash::report::LogReporter;
use socialdash::selection::{
    country_options, x_axis_candidates, y_axis_candidates, ChartKind, PlatformSelection, Session,
    GRAPH_TYPE_OPTIONS, PLATFORMS,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "socialdash")]
#[command(about = "Chart a social media usage dataset by platform and country", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the platforms that can be selected
    Platforms,
    /// List the countries present in the dataset
    Countries {
        #[arg(long)]
        data: PathBuf,
    },
    /// List the columns offered for each axis of a custom chart
    Axes {
        #[arg(long)]
        data: PathBuf,
        /// Chart kind: bar, pie, scatter or histogram
        #[arg(long, default_value = "bar")]
        kind: String,
    },
    /// Render the overview charts for every platform
    Summary {
        #[arg(long)]
        data: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Render one chart per selected platform for a country
    Show {
        #[arg(long)]
        data: PathBuf,
        /// JSON session file with apps, country, graphs and render options
        #[arg(long, conflicts_with_all = ["apps", "country", "graph"])]
        session: Option<PathBuf>,
        /// Comma-separated platforms, e.g. Instagram,YouTube
        #[arg(long, value_delimiter = ',')]
        apps: Vec<String>,
        #[arg(long)]
        country: Option<String>,
        /// Per-platform graph, e.g. instagram="Year vs Likes" or twitter="pie(x: User)"
        #[arg(long, value_parser = parse_key_val)]
        graph: Vec<(String, String)>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Directory the chart files are written to
    #[arg(long, default_value = "charts")]
    out: PathBuf,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

impl OutputArgs {
    fn apply(&self, mut options: RenderOptions) -> RenderOptions {
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(format) = self.format {
            options.format = format;
        }
        options
    }
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected APP=GRAPH, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let reporter = LogReporter;
    let mut loader = DataLoader::new();

    match args.command {
        Command::Platforms => {
            for platform in PLATFORMS {
                println!("{}", platform);
            }
        }
        Command::Countries { data } => {
            for country in country_options(loader.load(&data, &reporter)) {
                println!("{}", country);
            }
        }
        Command::Axes { data, kind } => {
            let kind: ChartKind = kind.parse()?;
            let table = loader.load(&data, &reporter);
            println!("graph types: {}", GRAPH_TYPE_OPTIONS.join(", "));
            println!("x: {}", x_axis_candidates(table).join(", "));
            match y_axis_candidates(kind, table) {
                Some(columns) => println!("y: {}", columns.join(", ")),
                None => println!("y: (none for {})", kind),
            }
        }
        Command::Summary { data, output } => {
            let table = loader.load(&data, &reporter);
            let options = output.apply(RenderOptions::default());
            let charts = Dashboard::new(table, options.clone(), &reporter).summary();
            for path in write_charts(&output.out, &charts, &options)? {
                println!("{}", path.display());
            }
        }
        Command::Show {
            data,
            session,
            apps,
            country,
            graph,
            output,
        } => {
            let (state, options) = match session {
                Some(path) => SessionFile::from_path(&path)?.into_state()?,
                None => {
                    let mut state = match Session::new().advance(PlatformSelection::from_names(&apps))? {
                        Session::Configuring(state) => state,
                        Session::ChoosingPlatforms => anyhow::bail!("No platforms selected"),
                    };
                    if let Some(country) = country {
                        state = state.with_country(country);
                    }
                    for (app, spec) in &graph {
                        let config = parse_graph(spec).with_context(|| format!("Graph for '{}'", app))?;
                        state = state.with_graph(app, config)?;
                    }
                    (state, RenderOptions::default())
                }
            };
            let options = output.apply(options);

            let table = loader.load(&data, &reporter);
            let charts = Dashboard::new(table, options.clone(), &reporter).show(&state);
            for path in write_charts(&output.out, &charts, &options)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
