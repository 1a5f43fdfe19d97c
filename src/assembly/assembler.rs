use std::collections::{hash_map, HashMap};
use log::debug;
use crate::assembly::error::*;
use crate::assembly::lexer::{self, SourceTerm, Token};
use crate::isa::*;

// The symbolic argument of a statement before linking:
#[derive(Clone, Debug, PartialEq)]
pub enum Arg
{
	Literal(i32),
	Symbol(String),
}

// A parsed statement from the ".text" section.
// Each statement assembles into exactly one machine word.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement
{
	pub line: usize,
	pub label: Option<String>,
	pub opcode: Opcode,
	pub mode: Option<AddrMode>,
	pub arg: Option<Arg>,
}

// A single word from the ".data" section.
// String definitions expand into one leader term and one term per character;
// only "named" terms enter the label table.
#[derive(Clone, Debug, PartialEq)]
pub struct DataTerm
{
	pub line: usize,
	pub label: String,
	pub value: i32,
	pub named: bool,
}

// The fixed instruction-name table:
pub fn opcode_for_mnemonic(name: &str) -> Option<Opcode>
{
	match name
	{
		"ld" 	=> Some(Opcode::Ld),
		"st" 	=> Some(Opcode::St),
		"add" 	=> Some(Opcode::Add),
		"sub" 	=> Some(Opcode::Sub),
		"mul" 	=> Some(Opcode::Mul),
		"div" 	=> Some(Opcode::Div),
		"mod" 	=> Some(Opcode::Mod),
		"cmp" 	=> Some(Opcode::Cmp),
		"and" 	=> Some(Opcode::And),
		"or" 	=> Some(Opcode::Or),
		"out" 	=> Some(Opcode::Out),
		"in" 	=> Some(Opcode::In),
		"jmp" 	=> Some(Opcode::Jmp),
		"jz" 	=> Some(Opcode::Jz),
		"jnz" 	=> Some(Opcode::Jnz),
		"jn" 	=> Some(Opcode::Jn),
		"jp" 	=> Some(Opcode::Jp),
		"int" 	=> Some(Opcode::Int),
		"hlt" 	=> Some(Opcode::Hlt),
		"eni" 	=> Some(Opcode::Eni),
		"dii" 	=> Some(Opcode::Dii),
		"fi" 	=> Some(Opcode::Fi),
		"inc" 	=> Some(Opcode::Inc),
		"dec" 	=> Some(Opcode::Dec),
		"nop" 	=> Some(Opcode::Nop),
		"lsl" 	=> Some(Opcode::Lsl),
		"asr" 	=> Some(Opcode::Asr),
		_ 		=> None,
	}
}

fn vector_label(slot: usize) -> String
{
	format!("int{:}", slot)
}

fn is_vector_label(name: &str) -> bool
{
	(0..INT_VECTORS).any(|slot| vector_label(slot) == name)
}

// Literals must fit the 32-bit signed machine word:
fn encode_value(line: usize, value: i64) -> Result<i32, EncodeError>
{
	i32::try_from(value).map_err(|_| EncodeError { line, value })
}

// A label definition must be an undotted identifier that is not an instruction name:
fn validate_label(line: usize, name: &str) -> Result<String, ParseError>
{
	if name.starts_with('.') || opcode_for_mnemonic(name).is_some()
	{
		return Err(ParseError::MalformedLabel { line, name: String::from(name) });
	}

	Ok(String::from(name))
}

// A leading "<ident> :" pair is a label definition unless the identifier is a mnemonic:
fn match_label(term: &SourceTerm) -> Option<&str>
{
	match (term.tokens.first(), term.tokens.get(1))
	{
		(Some(Token::Ident(name)), Some(Token::Colon)) if opcode_for_mnemonic(name).is_none() => Some(name),
		_ => None,
	}
}

// Pass A: translate the ".data" terms into data words.
// Line forms after "label :": nothing (reserved), one integer, or "<size> , <literal>".
fn map_terms_to_data(terms: &[SourceTerm]) -> Result<Vec<DataTerm>, TranslatorError>
{
	let mut data = vec![];

	for term in terms
	{
		let label = match (term.tokens.first(), term.tokens.get(1))
		{
			(Some(Token::Ident(name)), Some(Token::Colon)) 	=> validate_label(term.line, name)?,
			_ 												=> return Err(ParseError::MissingLabel { line: term.line }.into()),
		};

		match &term.tokens[2..]
		{
			[] =>
			{
				data.push(DataTerm { line: term.line, label, value: 0, named: true });
			},
			[Token::Int(value)] =>
			{
				let value = encode_value(term.line, *value)?;
				data.push(DataTerm { line: term.line, label, value, named: true });
			},
			[Token::Int(size), Token::Comma, Token::Str(text)] =>
			{
				let length = text.chars().count();

				if (*size <= 0) || (length as i64 != *size)
				{
					return Err(ParseError::BadStringSize { line: term.line, size: *size, actual: length }.into());
				}

				// The leader word carries the size under the label, one word per character follows:
				data.push(DataTerm { line: term.line, label: label.clone(), value: *size as i32, named: true });

				for (offset, symbol) in text.chars().enumerate()
				{
					data.push(DataTerm
					{
						line: term.line,
						label: format!("{:}(+{:})", label, offset + 1),
						value: symbol as i32,
						named: false,
					});
				}
			},
			_ => return Err(ParseError::MalformedData { line: term.line }.into()),
		}
	}

	Ok(data)
}

// Pass B, first sub-pass: collect every label occurring in ".text".
fn collect_statement_labels(terms: &[SourceTerm]) -> Result<HashMap<String, usize>, TranslatorError>
{
	let mut labels = HashMap::new();

	for term in terms
	{
		// A mnemonic in label position is a common slip and gets its own message:
		if let (Some(Token::Ident(name)), Some(Token::Colon)) = (term.tokens.first(), term.tokens.get(1))
		{
			if opcode_for_mnemonic(name).is_some()
			{
				return Err(ParseError::MalformedLabel { line: term.line, name: name.clone() }.into());
			}
		}

		let name = match match_label(term)
		{
			Some(name) 	=> validate_label(term.line, name)?,
			None 		=> continue,
		};

		match labels.entry(name)
		{
			hash_map::Entry::Occupied(entry) =>
			{
				return Err(ResolveError::DuplicateLabel { line: term.line, name: entry.key().clone() }.into());
			},
			hash_map::Entry::Vacant(entry) =>
			{
				entry.insert(term.line);
			},
		}
	}

	Ok(labels)
}

// Validate a symbolic argument against the label namespaces.
// Control-flow opcodes accept instruction labels and interrupt vectors in every mode,
// but plain data labels only behind at least one level of indirection.
fn validate_symbol
(
	line: usize,
	opcode: Opcode,
	mnemonic: &str,
	mode: AddrMode,
	name: &str,
	text_labels: &HashMap<String, usize>,
	data_labels: &HashMap<String, usize>,
) -> Result<(), TranslatorError>
{
	let in_text = text_labels.contains_key(name);
	let in_data = data_labels.contains_key(name);

	if opcode.is_control_flow()
	{
		let allowed = in_text || is_vector_label(name) || ((mode != AddrMode::Value) && in_data);

		if !allowed
		{
			if in_data
			{
				return Err(ResolveError::BadArgumentKind { line, mnemonic: String::from(mnemonic), name: String::from(name) }.into());
			}

			return Err(ResolveError::UndefinedLabel { line, name: String::from(name) }.into());
		}
	}
	else if !(in_text || in_data)
	{
		return Err(ResolveError::UndefinedLabel { line, name: String::from(name) }.into());
	}

	Ok(())
}

// Pass B, second sub-pass: walk ".text" sequentially and produce statements.
fn map_terms_to_statements
(
	terms: &[SourceTerm],
	text_labels: &HashMap<String, usize>,
	data_labels: &HashMap<String, usize>,
) -> Result<Vec<Statement>, TranslatorError>
{
	let mut statements = vec![];
	let mut pending: Option<(usize, String)> = None;

	for term in terms
	{
		let mut tokens = &term.tokens[..];
		let mut label = None;

		if let Some(name) = match_label(term)
		{
			label = Some(String::from(name));
			tokens = &term.tokens[2..];
		}

		// A bare "label :" line attaches its label to the next statement.
		// At most one label may be pending.
		if tokens.is_empty()
		{
			if let Some((line, prev)) = pending.take()
			{
				return Err(ParseError::DanglingLabel { line, name: prev }.into());
			}

			let name = label.expect("A non-empty term without content carries a label.");
			pending = Some((term.line, name));
			continue;
		}

		if label.is_some()
		{
			if let Some((line, prev)) = pending.take()
			{
				return Err(ParseError::DanglingLabel { line, name: prev }.into());
			}
		}
		else
		{
			label = pending.take().map(|(_, name)| name);
		}

		// Resolve the opcode from the fixed instruction-name table:
		let mnemonic = match tokens.first()
		{
			Some(Token::Ident(name)) 	=> name.clone(),
			Some(other) 				=> return Err(ParseError::UnknownMnemonic { line: term.line, name: format!("{:}", other) }.into()),
			None 						=> unreachable!(),
		};

		let opcode = match opcode_for_mnemonic(&mnemonic)
		{
			Some(opcode) 	=> opcode,
			None 			=> return Err(ParseError::UnknownMnemonic { line: term.line, name: mnemonic }.into()),
		};

		// Count '*' sigils to derive the addressing mode:
		let rest = &tokens[1..];
		let sigils = rest.iter().filter(|token| **token == Token::Star).count();
		let args: Vec<&Token> = rest.iter().filter(|token| **token != Token::Star).collect();

		if opcode.is_no_operand()
		{
			if (sigils > 0) || !args.is_empty()
			{
				return Err(ParseError::UnexpectedArgument { line: term.line, mnemonic }.into());
			}

			statements.push(Statement { line: term.line, label, opcode, mode: None, arg: None });
			continue;
		}

		let mode = match AddrMode::from_sigils(sigils)
		{
			Some(mode) 	=> mode,
			None 		=> return Err(ParseError::TooManySigils { line: term.line, count: sigils }.into()),
		};

		if args.len() > 1
		{
			return Err(ParseError::WrongArity { line: term.line }.into());
		}

		let arg = match args.first().copied()
		{
			None 						=> return Err(ParseError::MissingArgument { line: term.line, mnemonic }.into()),
			Some(Token::Int(value)) 	=> Arg::Literal(encode_value(term.line, *value)?),
			Some(Token::Ident(name)) 	=>
			{
				validate_symbol(term.line, opcode, &mnemonic, mode, name, text_labels, data_labels)?;
				Arg::Symbol(name.clone())
			},
			Some(_) 					=> return Err(ParseError::WrongArity { line: term.line }.into()),
		};

		statements.push(Statement { line: term.line, label, opcode, mode: Some(mode), arg: Some(arg) });
	}

	if let Some((line, name)) = pending
	{
		return Err(ParseError::DanglingLabel { line, name }.into());
	}

	Ok(statements)
}

// Pass D: substitute the numeric index of a referenced label.
// Control-flow arguments in value mode resolve through the instruction labels first,
// everything else prefers the data labels.
fn link_symbol
(
	stmt: &Statement,
	name: &str,
	text_addrs: &HashMap<String, usize>,
	data_addrs: &HashMap<String, usize>,
) -> Result<usize, TranslatorError>
{
	let address = if stmt.opcode.is_control_flow() && (stmt.mode == Some(AddrMode::Value))
	{
		text_addrs.get(name).or_else(|| data_addrs.get(name))
	}
	else
	{
		data_addrs.get(name).or_else(|| text_addrs.get(name))
	};

	address.copied().ok_or_else(|| ResolveError::UndefinedLabel { line: stmt.line, name: String::from(name) }.into())
}

// Translate a source program into a linked machine image.
pub fn translate(input: &str) -> Result<Image, TranslatorError>
{
	let sections = lexer::split_source(input)?;

	// Pass A (data terms):
	let data_terms = map_terms_to_data(&sections.data)?;

	// The data namespace also carries the synthesized interrupt-vector labels:
	let mut data_labels: HashMap<String, usize> = HashMap::new();

	for slot in 0..INT_VECTORS
	{
		data_labels.insert(vector_label(slot), 0);
	}

	data_labels.insert(String::from("int_acc"), 0);
	data_labels.insert(String::from("int_pc"), 0);

	for term in data_terms.iter().filter(|term| term.named)
	{
		match data_labels.entry(term.label.clone())
		{
			hash_map::Entry::Occupied(entry) =>
			{
				return Err(ResolveError::DuplicateLabel { line: term.line, name: entry.key().clone() }.into());
			},
			hash_map::Entry::Vacant(entry) =>
			{
				entry.insert(term.line);
			},
		}
	}

	// Pass B (statement terms):
	let text_labels = collect_statement_labels(&sections.text)?;
	let mut statements = map_terms_to_statements(&sections.text, &text_labels, &data_labels)?;

	// Pass C (layout): execution starts at "_start", the statements before it wrap around.
	let start = statements.iter()
		.position(|stmt| stmt.label.as_deref() == Some("_start"))
		.ok_or(ResolveError::MissingStart)?;

	statements.rotate_left(start);

	let mut text_addrs = HashMap::new();

	for (position, stmt) in statements.iter().enumerate()
	{
		if let Some(label) = &stmt.label
		{
			text_addrs.insert(label.clone(), MACHINE_START_ADDR + position);
		}
	}

	let data_base = MACHINE_START_ADDR + statements.len();
	let mut data_addrs = HashMap::new();

	for slot in 0..INT_VECTORS
	{
		data_addrs.insert(vector_label(slot), slot);
	}

	data_addrs.insert(String::from("int_acc"), INT_ACC_ADDR);
	data_addrs.insert(String::from("int_pc"), INT_PC_ADDR);

	for (offset, term) in data_terms.iter().enumerate()
	{
		if term.named
		{
			data_addrs.insert(term.label.clone(), data_base + offset);
		}
	}

	// Synthesize the interrupt vector: eight vector slots pointing at the default
	// handler, the two save slots, and the default handler itself.
	let mut words = Vec::with_capacity(INT_VECTOR_WORDS + statements.len() + data_terms.len());

	for slot in 0..INT_VECTORS
	{
		words.push(MachineWord::Data(DataWord
		{
			index: slot,
			label: Some(vector_label(slot)),
			value: DEFAULT_HANDLER_ADDR as i32,
			line: 0,
		}));
	}

	words.push(MachineWord::Data(DataWord { index: INT_ACC_ADDR, label: Some(String::from("int_acc")), value: 0, line: 0 }));
	words.push(MachineWord::Data(DataWord { index: INT_PC_ADDR, label: Some(String::from("int_pc")), value: 0, line: 0 }));

	words.push(MachineWord::Instruction(InstructionWord
	{
		index: DEFAULT_HANDLER_ADDR,
		opcode: Opcode::Fi,
		label: None,
		arg: None,
		mode: None,
		line: 0,
	}));

	// The statements, with symbolic arguments linked (pass D):
	for (position, stmt) in statements.iter().enumerate()
	{
		let arg = match &stmt.arg
		{
			None 					=> None,
			Some(Arg::Literal(value)) 	=> Some(*value),
			Some(Arg::Symbol(name)) 	=> Some(link_symbol(stmt, name, &text_addrs, &data_addrs)? as i32),
		};

		words.push(MachineWord::Instruction(InstructionWord
		{
			index: MACHINE_START_ADDR + position,
			opcode: stmt.opcode,
			label: stmt.label.clone(),
			arg,
			mode: stmt.mode,
			line: stmt.line,
		}));
	}

	// The data words close the image:
	for (offset, term) in data_terms.iter().enumerate()
	{
		words.push(MachineWord::Data(DataWord
		{
			index: data_base + offset,
			label: Some(term.label.clone()),
			value: term.value,
			line: term.line,
		}));
	}

	debug!("Translated {:} statements and {:} data words.", statements.len(), data_terms.len());

	Ok(Image(words))
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn word_at(image: &Image, index: usize) -> &MachineWord
	{
		&image.0[index]
	}

	fn instruction_at(image: &Image, index: usize) -> &InstructionWord
	{
		match word_at(image, index)
		{
			MachineWord::Instruction(word) 	=> word,
			MachineWord::Data(_) 			=> panic!("Expected an instruction word at index {:}.", index),
		}
	}

	fn data_at(image: &Image, index: usize) -> &DataWord
	{
		match word_at(image, index)
		{
			MachineWord::Data(word) 		=> word,
			MachineWord::Instruction(_) 	=> panic!("Expected a data word at index {:}.", index),
		}
	}

	#[test]
	fn minimal_program_gets_the_interrupt_vector_prefix()
	{
		let image = translate("section .text:\n_start: hlt\n").unwrap();

		assert_eq!(image.len(), INT_VECTOR_WORDS + 1);

		for slot in 0..INT_VECTORS
		{
			let word = data_at(&image, slot);
			assert_eq!(word.label.as_deref(), Some(format!("int{:}", slot).as_str()));
			assert_eq!(word.value, DEFAULT_HANDLER_ADDR as i32);
		}

		assert_eq!(data_at(&image, INT_ACC_ADDR).label.as_deref(), Some("int_acc"));
		assert_eq!(data_at(&image, INT_PC_ADDR).label.as_deref(), Some("int_pc"));
		assert_eq!(instruction_at(&image, DEFAULT_HANDLER_ADDR).opcode, Opcode::Fi);

		let entry = instruction_at(&image, MACHINE_START_ADDR);
		assert_eq!(entry.opcode, Opcode::Hlt);
		assert_eq!(entry.label.as_deref(), Some("_start"));
		assert_eq!(entry.mode, None);
		assert_eq!(entry.line, 2);
	}

	#[test]
	fn indices_match_positions()
	{
		let source = "section .data:\nx: 5\nsection .text:\n_start: ld *x\nhlt\n";
		let image = translate(source).unwrap();

		for (position, word) in image.0.iter().enumerate()
		{
			assert_eq!(word.index(), position);
		}
	}

	#[test]
	fn statements_before_start_wrap_around()
	{
		let source = "section .text:\nhelper: nop\njmp helper\n_start: jmp helper\nhlt\n";
		let image = translate(source).unwrap();

		// "_start" must land on the machine start address:
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR).label.as_deref(), Some("_start"));

		// The helper wraps around behind the trailing statements:
		let helper = image.find_label("helper").unwrap();
		assert_eq!(helper, MACHINE_START_ADDR + 2);
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR).arg, Some(helper as i32));
	}

	#[test]
	fn string_definitions_expand_to_leader_and_characters()
	{
		let source = "section .data:\nmsg: 5, \"hello\"\nsection .text:\n_start: hlt\n";
		let image = translate(source).unwrap();

		let leader = image.find_label("msg").unwrap();
		assert_eq!(data_at(&image, leader).value, 5);

		for (offset, symbol) in "hello".chars().enumerate()
		{
			let word = data_at(&image, leader + 1 + offset);
			assert_eq!(word.value, symbol as i32);
			assert_eq!(word.label.as_deref(), Some(format!("msg(+{:})", offset + 1).as_str()));
		}
	}

	#[test]
	fn reserved_declarations_hold_zero()
	{
		let source = "section .data:\nbuf:\nsection .text:\n_start: hlt\n";
		let image = translate(source).unwrap();

		assert_eq!(data_at(&image, image.find_label("buf").unwrap()).value, 0);
	}

	#[test]
	fn modes_follow_the_sigil_count()
	{
		let source = "section .data:\nx: 1\nsection .text:\n_start: ld 7\nld *x\nld **x\nhlt\n";
		let image = translate(source).unwrap();

		assert_eq!(instruction_at(&image, MACHINE_START_ADDR).mode, Some(AddrMode::Value));
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR + 1).mode, Some(AddrMode::Direct));
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR + 2).mode, Some(AddrMode::Indirect));
	}

	#[test]
	fn vector_labels_resolve_to_the_vector_slots()
	{
		let source = "section .text:\n_start: int int0\nst int3\nhlt\n";
		let image = translate(source).unwrap();

		assert_eq!(instruction_at(&image, MACHINE_START_ADDR).arg, Some(0));
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR + 1).arg, Some(3));
	}

	#[test]
	fn bare_labels_attach_to_the_next_statement()
	{
		let source = "section .text:\n_start: nop\nloop:\nhlt\n";
		let image = translate(source).unwrap();

		assert_eq!(image.find_label("loop"), Some(MACHINE_START_ADDR + 1));
		assert_eq!(instruction_at(&image, MACHINE_START_ADDR + 1).opcode, Opcode::Hlt);
	}

	#[test]
	fn two_bare_labels_in_a_row_are_fatal()
	{
		let source = "section .text:\n_start: nop\na:\nb:\nhlt\n";

		assert!(matches!
		(
			translate(source),
			Err(TranslatorError::Parse(ParseError::DanglingLabel { .. }))
		));
	}

	#[test]
	fn unknown_mnemonics_are_fatal()
	{
		assert!(matches!
		(
			translate("section .text:\n_start: frobnicate x\n"),
			Err(TranslatorError::Parse(ParseError::UnknownMnemonic { .. }))
		));
	}

	#[test]
	fn three_sigils_are_fatal()
	{
		assert!(matches!
		(
			translate("section .data:\nx: 1\nsection .text:\n_start: ld ***x\n"),
			Err(TranslatorError::Parse(ParseError::TooManySigils { count: 3, .. }))
		));
	}

	#[test]
	fn no_operand_opcodes_reject_arguments()
	{
		assert!(matches!
		(
			translate("section .text:\n_start: hlt 5\n"),
			Err(TranslatorError::Parse(ParseError::UnexpectedArgument { .. }))
		));
	}

	#[test]
	fn duplicate_data_labels_are_fatal()
	{
		assert!(matches!
		(
			translate("section .data:\nx: 1\nx: 2\nsection .text:\n_start: hlt\n"),
			Err(TranslatorError::Resolve(ResolveError::DuplicateLabel { .. }))
		));
	}

	#[test]
	fn missing_start_is_fatal()
	{
		assert!(matches!
		(
			translate("section .text:\nhlt\n"),
			Err(TranslatorError::Resolve(ResolveError::MissingStart))
		));
	}

	#[test]
	fn undefined_labels_are_fatal()
	{
		assert!(matches!
		(
			translate("section .text:\n_start: jmp nowhere\n"),
			Err(TranslatorError::Resolve(ResolveError::UndefinedLabel { .. }))
		));
	}

	#[test]
	fn control_flow_rejects_data_labels_in_value_mode()
	{
		assert!(matches!
		(
			translate("section .data:\nx: 1\nsection .text:\n_start: jmp x\n"),
			Err(TranslatorError::Resolve(ResolveError::BadArgumentKind { .. }))
		));

		// Behind an indirection the same label is fine:
		assert!(translate("section .data:\nx: 1\nsection .text:\n_start: jmp *x\nhlt\n").is_ok());
	}

	#[test]
	fn oversized_values_are_fatal()
	{
		assert!(matches!
		(
			translate("section .data:\nx: 4000000000\nsection .text:\n_start: hlt\n"),
			Err(TranslatorError::Encode(EncodeError { .. }))
		));
	}
}
