use clap::Parser;
use parvm::cli::Cli;
use parvm::runtime::show_heap;
use parvm::{samples, Runtime};

fn main() {
  let cli = Cli::parse();
  if let Err(err) = run(&cli) {
    eprintln!("{}", err);
    std::process::exit(1);
  }
}

fn run(cli: &Cli) -> Result<(), String> {
  let size = cli.memory_size / std::mem::size_of::<u64>();
  let tids = cli.threads.unwrap_or_else(parvm::default_heap_tids);

  let depth = match cli.params.first() {
    Some(param) => {
      param.parse::<u64>().map_err(|_| format!("'{}' is not a decimal number", param))?
    }
    None => 16,
  };

  let mut rt = Runtime::new(size, tids);
  samples::tree_fft(&mut rt.prog);
  let host = rt.alloc_term(&samples::main_call(depth));

  let init = std::time::Instant::now();
  rt.normalize(host);
  let time = init.elapsed();

  println!("{}", rt.readback(host));

  if cli.dump {
    eprintln!("{}", show_heap(&rt.heap));
  }

  let mrps = rt.cost() as f64 / time.as_micros().max(1) as f64;
  eprintln!();
  eprintln!("Rewrites: {} ({:.2} MR/s).", rt.cost(), mrps);
  eprintln!("Mem.Size: {} words.", rt.heap_size());

  Ok(())
}
