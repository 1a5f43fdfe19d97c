use std::fs;
use std::path::PathBuf;
use std::process;
use clap::Parser;
use log::{error, info, LevelFilter};
use accsim::isa::Image;
use accsim::machine::{parse_schedule, simulation};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "logs/machine.log";

#[derive(Parser)]
#[clap(version, about = "Execute a machine image with a scheduled input stream")]
struct Opts
{
	/// The JSON machine image
	image: PathBuf,

	/// The input schedule, a textual list of (tick, "char") pairs
	schedule: PathBuf,

	/// Upper bound on simulated ticks
	#[clap(long, default_value_t = 100_000)]
	limit: u64,
}

// Warnings go to stderr, the tick-level trace to the log file:
fn init_logging()
{
	fs::create_dir_all(LOG_DIR).expect("The log directory is writable.");

	let file = fern::log_file(LOG_FILE).expect("The log file is writable.");

	fern::Dispatch::new()
		.format(|out, message, record| out.finish(format_args!("{:5} [{:}] {:}", record.level(), record.target(), message)))
		.chain(fern::Dispatch::new().level(LevelFilter::Warn).chain(std::io::stderr()))
		.chain(fern::Dispatch::new().level(LevelFilter::Debug).chain(file))
		.apply()
		.expect("The logger is initialized exactly once.");
}

fn main()
{
	init_logging();

	let opts = Opts::parse();

	let encoded = match fs::read_to_string(&opts.image)
	{
		Ok(encoded) => encoded,
		Err(err) 	=>
		{
			error!("Cannot read \"{:}\": {:}", opts.image.display(), err);
			process::exit(1);
		},
	};

	let image = match Image::decode(&encoded)
	{
		Ok(image) 	=> image,
		Err(err) 	=>
		{
			error!("Cannot decode \"{:}\": {:}", opts.image.display(), err);
			process::exit(1);
		},
	};

	let schedule_text = match fs::read_to_string(&opts.schedule)
	{
		Ok(text) 	=> text,
		Err(err) 	=>
		{
			error!("Cannot read \"{:}\": {:}", opts.schedule.display(), err);
			process::exit(1);
		},
	};

	let schedule = match parse_schedule(&schedule_text)
	{
		Ok(schedule) 	=> schedule,
		Err(err) 		=>
		{
			error!("{:}", err);
			process::exit(1);
		},
	};

	match simulation(&image, &schedule, opts.limit, true)
	{
		Ok(run) =>
		{
			print!("{:}", run.output);
			info!("instr_counter: {:} ticks: {:}", run.instructions, run.ticks);
		},
		Err(err) =>
		{
			error!("Simulation failed: {:}", err);
			process::exit(1);
		},
	}
}
