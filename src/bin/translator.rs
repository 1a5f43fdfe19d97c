use std::fs;
use std::path::PathBuf;
use std::process;
use clap::Parser;
use log::{error, LevelFilter};
use accsim::assembly;

#[derive(Parser)]
#[clap(version, about = "Translate assembly source into a JSON machine image")]
struct Opts
{
	/// The assembly source file
	source: PathBuf,

	/// The image file to write on success
	target: PathBuf,
}

fn init_logging()
{
	fern::Dispatch::new()
		.format(|out, message, record| out.finish(format_args!("{:5} [{:}] {:}", record.level(), record.target(), message)))
		.level(LevelFilter::Info)
		.chain(std::io::stderr())
		.apply()
		.expect("The logger is initialized exactly once.");
}

fn main()
{
	init_logging();

	let opts = Opts::parse();

	let source = match fs::read_to_string(&opts.source)
	{
		Ok(source) 	=> source,
		Err(err) 	=>
		{
			error!("Cannot read \"{:}\": {:}", opts.source.display(), err);
			process::exit(1);
		},
	};

	// On failure, log the reason and leave the target untouched:
	let image = match assembly::translate(&source)
	{
		Ok(image) 	=> image,
		Err(err) 	=>
		{
			error!("Translation failed: {:}", err);
			process::exit(1);
		},
	};

	if let Err(err) = fs::write(&opts.target, image.encode())
	{
		error!("Cannot write \"{:}\": {:}", opts.target.display(), err);
		process::exit(1);
	}

	println!("source LoC: {:} code instr: {:}", source.lines().count(), image.len());
}
