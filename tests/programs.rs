use lc3vm::registers::{Condition, Register};
use lc3vm::{ConsoleError, Emulator, Fault, LoadError, State, StreamConsole};

type TestConsole = StreamConsole<&'static [u8], Vec<u8>>;

/// Serializes an origin and its words the way assemblers write object files.
fn image(origin: u16, words: &[u16]) -> Vec<u8> {
    std::iter::once(origin)
        .chain(words.iter().copied())
        .flat_map(u16::to_be_bytes)
        .collect()
}

fn boot(images: &[Vec<u8>], input: &'static [u8]) -> Emulator<TestConsole> {
    let mut emu = Emulator::new(StreamConsole::new(input, Vec::new()));
    for bytes in images {
        emu.load_image(&bytes[..]).unwrap();
    }
    emu
}

fn output(emu: Emulator<TestConsole>) -> String {
    String::from_utf8(emu.into_console().into_parts().1).unwrap()
}

#[test]
fn halt_image_stops_after_one_step() {
    let mut emu = boot(&[image(0x3000, &[0xF025])], b"");
    assert_eq!(emu.step().unwrap(), &State::Halted);
    assert_eq!(emu.steps(), 1);
    assert_eq!(emu.registers().pc, 0x3001);
    assert_eq!(emu.registers().get(Register::R0), 0);
    assert_eq!(emu.registers().get(Register::R7), 0x3001);
    assert_eq!(emu.registers().cond, Condition::Zero);
    assert_eq!(output(emu), "HALT\n");
}

#[test]
fn rti_image_faults() {
    let mut emu = boot(&[image(0x3000, &[0x8000])], b"");
    emu.run().unwrap();
    assert_eq!(
        emu.state(),
        &State::Faulted(Fault::UnimplementedOpcode {
            addr: 0x3000,
            instruction: 0x8000
        })
    );
    assert_eq!(emu.registers().pc, 0x3001);
    assert!(output(emu).is_empty());
}

#[test]
fn subroutine_call_and_return() {
    // 0x3000 JSR #3       ; R7 = 0x3001
    // 0x3001 ADD R1, R1, #1
    // 0x3002 HALT
    // 0x3003 .FILL 0
    // 0x3004 ADD R0, R0, #7
    // 0x3005 JMP R7
    let mut emu = boot(
        &[image(0x3000, &[0x4803, 0x1261, 0xF025, 0x0000, 0x1027, 0xC1C0])],
        b"",
    );
    emu.step().unwrap();
    let saved = emu.registers().get(Register::R7);
    assert_eq!(saved, 0x3001);
    assert_eq!(emu.registers().pc, 0x3004);

    emu.step().unwrap();
    emu.step().unwrap();
    assert_eq!(emu.registers().pc, saved);

    assert_eq!(emu.run().unwrap(), &State::Halted);
    assert_eq!(emu.registers().get(Register::R0), 7);
    assert_eq!(emu.registers().get(Register::from_field(1)), 1);
}

#[test]
fn countdown_loop() {
    // AND R0, R0, #0 ; ADD R0, R0, #5 ; loop: ADD R1, R1, #2 ; ADD R0, R0, #-1 ; BRp loop ; HALT
    let mut emu = boot(
        &[image(0x3000, &[0x5020, 0x1025, 0x1262, 0x103F, 0x03FD, 0xF025])],
        b"",
    );
    assert_eq!(emu.run().unwrap(), &State::Halted);
    assert_eq!(emu.registers().get(Register::from_field(1)), 10);
    assert_eq!(emu.registers().get(Register::R0), 0);
    assert_eq!(emu.registers().cond, Condition::Zero);
    assert_eq!(emu.steps(), 2 + 5 * 3 + 1);
}

#[test]
fn prompt_echo_and_packed_string() {
    // IN ; OUT ; LEA R0, #2 ; PUTSP ; HALT ; "ok!" packed
    let mut emu = boot(
        &[image(
            0x3000,
            &[0xF023, 0xF021, 0xE002, 0xF024, 0xF025, 0x6B6F, 0x0021, 0x0000],
        )],
        b"y",
    );
    assert_eq!(emu.run().unwrap(), &State::Halted);
    assert_eq!(output(emu), "Enter a character: yyok!HALT\n");
}

#[test]
fn data_image_loaded_separately() {
    // LDI R2, #1 ; HALT ; .FILL 0x3100, with the data coming from a second image
    let program = image(0x3000, &[0xA401, 0xF025, 0x3100]);
    let data = image(0x3100, &[0x0063]);
    let mut emu = boot(&[program, data], b"");
    emu.run().unwrap();
    assert_eq!(emu.registers().get(Register::from_field(2)), 0x63);
}

#[test]
fn getc_without_input_reports_end_of_input() {
    let mut emu = boot(&[image(0x3000, &[0xF020, 0xF025])], b"");
    assert!(matches!(emu.run(), Err(ConsoleError::EndOfInput)));
    assert_eq!(emu.state(), &State::Running);
    // nothing of the failed GETC sticks
    assert_eq!(emu.registers().pc, 0x3000);
    assert_eq!(emu.registers().get(Register::R7), 0);
    assert_eq!(emu.steps(), 0);
}

#[test]
fn truncated_image_is_rejected() {
    let mut emu = Emulator::new(StreamConsole::new(&b""[..], Vec::<u8>::new()));
    assert!(matches!(
        emu.load_image(&[0x30u8][..]),
        Err(LoadError::MissingOrigin)
    ));
}
