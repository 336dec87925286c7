use std::io;
use std::process;

use ja3::output;
use ja3::Ja3;

enum Format {
    Plain,
    Delimited(String),
    Json,
}

fn usage() -> ! {
    eprintln!("usage: ja3 [--csv | --tsv | --json] [--separator SEP] <capture>");
    process::exit(1);
}

fn main() {
    env_logger::init();

    let mut format = Format::Plain;
    let mut path = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--csv" => format = Format::Delimited(",".to_string()),
            "--tsv" => format = Format::Delimited("\t".to_string()),
            "--json" => format = Format::Json,
            "--separator" => match args.next() {
                Some(sep) => format = Format::Delimited(sep),
                None => usage(),
            },
            _ if path.is_none() => path = Some(arg),
            _ => usage(),
        }
    }
    let path = path.unwrap_or_else(|| usage());

    let hashes = match Ja3::new(&path).process_pcap() {
        Ok(hashes) => hashes,
        Err(e) => {
            eprintln!("{}: {}", path, e);
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let res = match format {
        Format::Plain => {
            for hash in hashes {
                println!("{}", hash);
            }
            Ok(())
        }
        Format::Delimited(sep) => output::write_delimited(&hashes, stdout.lock(), &sep),
        Format::Json => output::write_json(&hashes, stdout.lock()),
    };
    if let Err(e) = res {
        eprintln!("{}", e);
        process::exit(1);
    }
}
