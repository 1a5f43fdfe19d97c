use crate::isa::*;
use crate::machine::RuntimeError;

// The memory unit owns the address register and the word array.
// Code and data live side by side; the sum type keeps them apart at runtime.
pub struct Unit
{
	// "Address register" (AR)
	// Holds the memory address for the next data access
	pub ar: i32,

	memory: Box<[MachineWord]>,
}

impl Unit
{
	pub fn new(words: usize) -> Unit
	{
		// All slots start out as anonymous zeroed data words:
		let memory: Vec<_> = (0..words)
			.map(|index| MachineWord::Data(DataWord { index, label: None, value: 0, line: 0 }))
			.collect();

		Unit
		{
			ar: 0,
			memory: memory.into_boxed_slice(),
		}
	}

	pub fn memory(&self) -> &[MachineWord]
	{
		&self.memory
	}

	pub fn size(&self) -> usize
	{
		self.memory.len()
	}

	// Load a linked image to offset 0.
	// The image must fit and respect the index invariant.
	pub fn load_image(&mut self, image: &Image) -> Result<(), RuntimeError>
	{
		if image.len() > self.memory.len()
		{
			return Err(RuntimeError::ImageTooLarge { words: image.len(), memory: self.memory.len() });
		}

		for (position, word) in image.0.iter().enumerate()
		{
			if word.index() != position
			{
				return Err(RuntimeError::MalformedImage { position, index: word.index() });
			}

			self.memory[position] = word.clone();
		}

		Ok(())
	}

	fn slot(&self, addr: i32) -> Result<usize, RuntimeError>
	{
		if (addr < 0) || (addr as usize >= self.memory.len())
		{
			return Err(RuntimeError::AddressOutOfRange { addr });
		}

		Ok(addr as usize)
	}

	// Fetch a full machine word (instruction fetch goes through here):
	pub(crate) fn read_word(&self, addr: usize) -> Result<&MachineWord, RuntimeError>
	{
		self.memory.get(addr).ok_or(RuntimeError::AddressOutOfRange { addr: addr as i32 })
	}

	// Read the data value at AR.
	// The slot must hold a data word at simulation time.
	pub(crate) fn read_memory(&self) -> Result<i32, RuntimeError>
	{
		let slot = self.slot(self.ar)?;

		match &self.memory[slot]
		{
			MachineWord::Data(word) 		=> Ok(word.value),
			MachineWord::Instruction(_) 	=> Err(RuntimeError::DataAccessToInstruction { addr: slot }),
		}
	}

	// Write a value into the data word at AR:
	pub(crate) fn write_memory(&mut self, value: i32) -> Result<(), RuntimeError>
	{
		let slot = self.slot(self.ar)?;

		match &mut self.memory[slot]
		{
			MachineWord::Data(word) =>
			{
				word.value = value;
				Ok(())
			},
			MachineWord::Instruction(_) => Err(RuntimeError::WriteToInstruction { addr: slot }),
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn image_with_one_instruction() -> Image
	{
		Image(vec!
		[
			MachineWord::Data(DataWord { index: 0, label: Some(String::from("x")), value: 7, line: 1 }),
			MachineWord::Instruction(InstructionWord
			{
				index: 1,
				opcode: Opcode::Hlt,
				label: None,
				arg: None,
				mode: None,
				line: 2,
			}),
		])
	}

	#[test]
	fn reads_and_writes_go_through_the_address_register()
	{
		let mut unit = Unit::new(16);
		unit.load_image(&image_with_one_instruction()).unwrap();

		unit.ar = 0;
		assert_eq!(unit.read_memory().unwrap(), 7);

		unit.write_memory(-5).unwrap();
		assert_eq!(unit.read_memory().unwrap(), -5);
	}

	#[test]
	fn data_access_to_an_instruction_slot_fails()
	{
		let mut unit = Unit::new(16);
		unit.load_image(&image_with_one_instruction()).unwrap();

		unit.ar = 1;
		assert!(matches!(unit.read_memory(), Err(RuntimeError::DataAccessToInstruction { addr: 1 })));
		assert!(matches!(unit.write_memory(0), Err(RuntimeError::WriteToInstruction { addr: 1 })));
	}

	#[test]
	fn addresses_outside_memory_fail()
	{
		let mut unit = Unit::new(4);

		unit.ar = -1;
		assert!(matches!(unit.read_memory(), Err(RuntimeError::AddressOutOfRange { .. })));

		unit.ar = 4;
		assert!(matches!(unit.read_memory(), Err(RuntimeError::AddressOutOfRange { .. })));
	}

	#[test]
	fn images_with_broken_indices_are_rejected()
	{
		let mut unit = Unit::new(16);
		let mut image = image_with_one_instruction();

		match &mut image.0[1]
		{
			MachineWord::Instruction(word) 	=> word.index = 5,
			MachineWord::Data(_) 			=> unreachable!(),
		}

		assert!(matches!(unit.load_image(&image), Err(RuntimeError::MalformedImage { position: 1, index: 5 })));
	}
}
