use clap::Parser as ClapParser;
use pull_csv::{Config, Parser};

#[derive(ClapParser, Debug)]
struct Args {
    /// Path to target CSV file
    path: String,

    /// Whether the first row holds column names
    #[arg(long)]
    headers: bool,

    /// Field delimiter, inferred from the file extension when omitted
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Number of leading lines to ignore
    #[arg(long, default_value_t = 0)]
    skip_lines: i64,

    /// Whether to tolerate malformed quoting
    #[arg(long)]
    liberal: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let delimiter = args.delimiter.unwrap_or_else(|| {
        if args.path.ends_with(".tsv") {
            "\t".to_string()
        } else {
            ",".to_string()
        }
    });

    let mut config = Config::new();
    config
        .col_sep(delimiter)
        .headers(args.headers)
        .skip_lines(args.skip_lines)
        .liberal_parsing(args.liberal);

    let mut parser = Parser::from_path(&args.path, &config)?;

    let mut count: u64 = 0;

    while parser.shift()?.is_some() {
        count += 1;
    }

    println!("{}", count);

    Ok(())
}
