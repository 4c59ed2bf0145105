use clap::Parser as ClapParser;
use pull_csv::{Config, Parser};

#[derive(ClapParser, Debug)]
struct Args {
    /// Path to target CSV file
    path: String,

    /// Whether the first row holds column names
    #[arg(long)]
    headers: bool,

    /// Field delimiter
    #[arg(short, long, default_value_t = ',')]
    delimiter: char,
}

fn main() -> pull_csv::Result<()> {
    let args = Args::parse();

    let mut config = Config::new();
    config
        .headers(args.headers)
        .col_sep(args.delimiter.to_string());

    let mut parser = Parser::from_path(&args.path, &config)?;

    let mut count: u64 = 0;

    for row in parser.rows() {
        std::hint::black_box(row?);
        count += 1;
    }

    println!("{}", count);

    Ok(())
}
