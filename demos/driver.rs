use std::fs;
use std::path::PathBuf;

use chain_hash::HashTable;
use chain_hash::TableError;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// Capacity hint passed to the table.
    #[arg(short = 'c', long = "capacity", default_value_t = 7)]
    capacity: usize,

    /// Load one key per line from this file instead of the built-in sample.
    #[arg(short = 'd', long = "dict")]
    dict: Option<PathBuf>,

    /// Print the bucket occupancy after each phase.
    #[arg(long = "dump")]
    dump: bool,
}

const KEY1: &[u8] = b"EzEzEzEzEzEzEzEz";
const KEY2: &[u8] = b"EzEzEzEzEzEzEzFY";

const SHORT_KEYS: [&str; 12] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve",
];

fn try_get(table: &HashTable<&str>, key: &[u8]) {
    let name = String::from_utf8_lossy(key);
    match table.get(key) {
        Some(value) => println!("{name} => {value}"),
        None => println!("{name} is not in table."),
    }
}

fn show(table: &HashTable<&str>, dump: bool) {
    if dump {
        println!("Table state:");
        print!("{}", table.dump());
    }
}

fn run_sample(table: &mut HashTable<&str>, dump: bool) -> Result<(), TableError> {
    try_get(table, KEY1);

    println!("Inserting {} into table.", String::from_utf8_lossy(KEY1));
    table.set(KEY1, "my test string")?;
    try_get(table, KEY1);

    println!("Inserting {} into table.", String::from_utf8_lossy(KEY2));
    table.set(KEY2, "another test string")?;
    try_get(table, KEY1);
    try_get(table, KEY2);
    show(table, dump);

    table.set(KEY1, "Overwrite a string somewhere.")?;
    try_get(table, KEY1);
    try_get(table, KEY2);
    show(table, dump);

    for key in SHORT_KEYS {
        table.set(key.as_bytes(), key)?;
    }
    for key in SHORT_KEYS {
        try_get(table, key.as_bytes());
    }
    show(table, dump);

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let contents;
    let mut table = HashTable::with_capacity(args.capacity)?;
    println!(
        "Created HashTable with {} buckets (requested {})",
        table.bucket_count(),
        args.capacity
    );

    match &args.dict {
        Some(path) => {
            contents = fs::read_to_string(path)?;
            let mut duplicates = 0;
            for line in contents.lines() {
                if table.set(line.as_bytes(), line)?.is_some() {
                    duplicates += 1;
                }
            }
            println!(
                "Loaded {} keys from {} ({} duplicates)",
                table.len(),
                path.display(),
                duplicates
            );
            show(&table, args.dump);
        }
        None => run_sample(&mut table, args.dump)?,
    }

    let mut visited = 0;
    let mut valid = table.iter_first();
    while valid {
        visited += 1;
        valid = table.iter_next();
    }
    println!(
        "Iterated {} of {} entries across {} buckets",
        visited,
        table.len(),
        table.bucket_count()
    );

    table.print_chain_histogram();
    table.debug_stats().print();

    table.teardown_with(|_| {});
    Ok(())
}
