use clap::Parser;
use csv::{ReaderBuilder, StringRecord};

#[derive(Parser, Debug)]
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

fn main() -> csv::Result<()> {
    let args = Args::parse();

    let mut reader = ReaderBuilder::new()
        .has_headers(args.headers)
        .delimiter(args.delimiter as u8)
        .flexible(true)
        .from_path(&args.path)?;

    let headers = if args.headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };

    let mut count: u64 = 0;
    let mut record = StringRecord::new();

    while reader.read_record(&mut record)? {
        // Same per-row work as building a row keyed by headers
        if let Some(headers) = &headers {
            let row = headers
                .iter()
                .zip(record.iter())
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>();

            std::hint::black_box(row);
        } else {
            std::hint::black_box(record.iter().map(String::from).collect::<Vec<_>>());
        }

        count += 1;
    }

    println!("{}", count);

    Ok(())
}
