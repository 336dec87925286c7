use ja3::Ja3;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let iface = match args.get(1) {
        Some(iface) => iface,
        None => {
            eprintln!("usage: stream <interface>");
            std::process::exit(1);
        }
    };

    if let Err(e) = Ja3::new(iface).process_live(|x| println!("{}", x)) {
        eprintln!("{}: {}", iface, e);
        std::process::exit(1);
    }
}
