//! Disassembly: the inverse of [`crate::instructions::Mnemonic::encoding`].
//!
//! Only used to test the assemble-then-disassemble round-trip property —
//! nothing in the assembler or the CPU calls this at runtime. A display
//! collaborator wanting to show source next to a `Usage::Code` word would
//! be the one real caller outside tests.

/// Disassembles one machine word back into its mnemonic text.
///
/// Returns `None` for a register-reference or input/output word that does
/// not match exactly one of the fixed single-bit encodings — the assembler
/// itself never emits anything else, since each source line names exactly
/// one RRI/IOI mnemonic.
pub fn disassemble(word: u16) -> Option<String> {
    let opcode = (word >> 12) & 0x7;
    let indirect = word & 0x8000 != 0;

    if opcode != 7 {
        let mnemonic = match opcode {
            0 => "AND",
            1 => "ADD",
            2 => "LDA",
            3 => "STA",
            4 => "BUN",
            5 => "BSA",
            6 => "ISZ",
            _ => unreachable!("opcode is masked to 3 bits"),
        };
        let address = word & 0x0FFF;
        return Some(if indirect {
            format!("{} {:03X} I", mnemonic, address)
        } else {
            format!("{} {:03X}", mnemonic, address)
        });
    }

    let mnemonic = match word {
        0x7800 => "CLA",
        0x7400 => "CLE",
        0x7200 => "CMA",
        0x7100 => "CME",
        0x7080 => "CIR",
        0x7040 => "CIL",
        0x7020 => "INC",
        0x7010 => "SPA",
        0x7008 => "SNA",
        0x7004 => "SZA",
        0x7002 => "SZE",
        0x7001 => "HLT",
        0xF800 => "INP",
        0xF400 => "OUT",
        0xF200 => "SKI",
        0xF100 => "SKO",
        0xF080 => "ION",
        0xF040 => "IOF",
        _ => return None,
    };
    Some(mnemonic.to_string())
}
