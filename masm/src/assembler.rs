//! The two-pass assembler itself: pass 1 binds labels, validates structure,
//! and resolves every literal whose value doesn't depend on the symbol
//! table (`ORG`, `HEX`, `DEC`); pass 2 resolves MRI operands against the
//! now-complete symbol table and emits machine words.

use std::collections::BTreeMap;

use mano::arith::dec_to_word16;
use mano_util::EnumFromStr;

use crate::error::AssembleError;
use crate::instructions::{Encoding, Mnemonic};
use crate::int_util::{parse_dec, parse_hex};
use crate::labels::{is_valid_label, LabelMap};
use crate::lexer::tokenize;

/// Whether the word assembled at an address represents executable code or
/// literal data — consumed only by display collaborators, never by the CPU.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Usage {
    Code,
    Data,
}

enum LineBody<'a> {
    Org,
    End,
    Hex { word: u16 },
    Dec { word: u16 },
    Instruction {
        mnemonic: Mnemonic,
        operand: Option<&'a str>,
        indirect: bool,
    },
}

struct ParsedLine<'a> {
    label: Option<&'a str>,
    body: LineBody<'a>,
    address: u16,
    line_no: usize,
}

struct Pass1Output<'a> {
    lines: Vec<ParsedLine<'a>>,
    labels: LabelMap,
    start_address: u16,
    errors: Vec<AssembleError>,
}

/// Parses one line's tokens into a [`LineBody`], resolving `ORG`/`HEX`/`DEC`
/// literals immediately (pass 1 can validate these without the symbol
/// table) and pushing any errors onto `errors`. Returns `None` when the
/// line contributes nothing further to pass 1 or 2 — either because it was
/// malformed, or (for `ORG`) because its only effect is on the location
/// counter, which the caller has already applied.
fn parse_body<'a>(
    line_no: usize,
    tokens: &[&'a str],
    location: &mut u16,
    start_address: &mut Option<u16>,
    errors: &mut Vec<AssembleError>,
) -> Option<LineBody<'a>> {
    let head = tokens[0].to_ascii_uppercase();
    let rest = &tokens[1..];

    match head.as_str() {
        "ORG" => match rest.first() {
            Some(&literal) => match parse_hex(literal, 3) {
                Some(value) => {
                    *location = value;
                    if start_address.is_none() {
                        *start_address = Some(value);
                    }
                    Some(LineBody::Org)
                }
                None => {
                    errors.push(AssembleError::OrgOutOfRange {
                        line: line_no,
                        literal: literal.to_owned(),
                    });
                    None
                }
            },
            None => {
                errors.push(AssembleError::MissingOperand {
                    line: line_no,
                    statement: "ORG".to_owned(),
                });
                None
            }
        },
        "END" => Some(LineBody::End),
        "HEX" => match rest.first() {
            Some(&literal) => match parse_hex(literal, 4) {
                Some(word) => Some(LineBody::Hex { word }),
                None => {
                    errors.push(AssembleError::LiteralOutOfRange {
                        line: line_no,
                        literal: literal.to_owned(),
                    });
                    None
                }
            },
            None => {
                errors.push(AssembleError::MissingOperand {
                    line: line_no,
                    statement: "HEX".to_owned(),
                });
                None
            }
        },
        "DEC" => match rest.first() {
            Some(&literal) => match parse_dec(literal).and_then(dec_to_word16) {
                Some(word) => Some(LineBody::Dec { word }),
                None => {
                    errors.push(AssembleError::LiteralOutOfRange {
                        line: line_no,
                        literal: literal.to_owned(),
                    });
                    None
                }
            },
            None => {
                errors.push(AssembleError::MissingOperand {
                    line: line_no,
                    statement: "DEC".to_owned(),
                });
                None
            }
        },
        _ => match Mnemonic::from_str(&head) {
            Ok(mnemonic) => {
                if mnemonic.is_mri() {
                    match rest.first() {
                        Some(&operand) => {
                            let indirect = rest
                                .get(1)
                                .map_or(false, |tok| tok.eq_ignore_ascii_case("I"));
                            Some(LineBody::Instruction {
                                mnemonic,
                                operand: Some(operand),
                                indirect,
                            })
                        }
                        None => {
                            errors.push(AssembleError::MissingOperand {
                                line: line_no,
                                statement: head,
                            });
                            None
                        }
                    }
                } else if rest.is_empty() {
                    Some(LineBody::Instruction {
                        mnemonic,
                        operand: None,
                        indirect: false,
                    })
                } else {
                    errors.push(AssembleError::UnexpectedOperand {
                        line: line_no,
                        mnemonic: head,
                    });
                    None
                }
            }
            Err(_) => {
                errors.push(AssembleError::UnknownMnemonic {
                    line: line_no,
                    mnemonic: tokens[0].to_owned(),
                });
                None
            }
        },
    }
}

fn run_pass1(source: &str) -> Pass1Output<'_> {
    let mut lines = Vec::new();
    let mut labels = LabelMap::new();
    let mut start_address = None;
    let mut errors = Vec::new();
    let mut location: u16 = 0;

    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let tokenized = match tokenize(raw_line) {
            Some(t) => t,
            None => continue,
        };

        if let Some(label) = tokenized.label {
            if !is_valid_label(label) {
                errors.push(AssembleError::InvalidLabel {
                    line: line_no,
                    label: label.to_owned(),
                });
            } else if labels.contains_key(label) {
                errors.push(AssembleError::DuplicateLabel {
                    line: line_no,
                    label: label.to_owned(),
                });
            } else {
                // Bind before any counter change this line makes.
                labels.insert(label.to_owned(), location);
            }
        }

        if tokenized.tokens.is_empty() {
            errors.push(AssembleError::EmptyStatement { line: line_no });
            continue;
        }

        let address = location;
        let body = match parse_body(
            line_no,
            &tokenized.tokens,
            &mut location,
            &mut start_address,
            &mut errors,
        ) {
            Some(body) => body,
            None => continue,
        };

        match &body {
            LineBody::Org { .. } | LineBody::End => {}
            LineBody::Hex { .. } | LineBody::Dec { .. } | LineBody::Instruction { .. } => {
                location = location.wrapping_add(1) & 0x0FFF;
            }
        }

        lines.push(ParsedLine {
            label: tokenized.label,
            body,
            address,
            line_no,
        });
    }

    Pass1Output {
        lines,
        labels,
        start_address: start_address.unwrap_or(0),
        errors,
    }
}

fn resolve_mri_operand(
    line_no: usize,
    operand: &str,
    labels: &LabelMap,
    errors: &mut Vec<AssembleError>,
) -> Option<u16> {
    // Symbol table first: a defined label always shadows a same-spelled
    // hex literal (`A`, `B`, `C`, ... are valid hex digits too).
    if let Some(&address) = labels.get(operand) {
        return Some(address);
    }
    match parse_hex(operand, 3) {
        Some(value) => Some(value),
        None => {
            errors.push(AssembleError::InvalidOperand {
                line: line_no,
                operand: operand.to_owned(),
            });
            None
        }
    }
}

fn run_pass2(
    pass1: &Pass1Output,
) -> (BTreeMap<u16, u16>, BTreeMap<u16, Usage>, Vec<AssembleError>) {
    let mut machine_code = BTreeMap::new();
    let mut usage = BTreeMap::new();
    let mut errors = Vec::new();

    for line in &pass1.lines {
        let (word, line_usage) = match &line.body {
            LineBody::Org | LineBody::End => continue,
            LineBody::Hex { word } => (*word, Usage::Data),
            LineBody::Dec { word } => (*word, Usage::Data),
            LineBody::Instruction {
                mnemonic,
                operand,
                indirect,
            } => {
                let word = match mnemonic.encoding() {
                    Encoding::Fixed { word } => word,
                    Encoding::Mri { opcode } => {
                        let operand = operand.expect("MRI instructions always carry an operand");
                        let address = match resolve_mri_operand(
                            line.line_no,
                            operand,
                            &pass1.labels,
                            &mut errors,
                        ) {
                            Some(address) => address,
                            None => continue,
                        };
                        let mut word = (opcode << 12) | (address & 0x0FFF);
                        if *indirect {
                            word |= 0x8000;
                        }
                        word
                    }
                };
                (word, Usage::Code)
            }
        };

        machine_code.insert(line.address, word);
        usage.insert(line.address, line_usage);
    }

    (machine_code, usage, errors)
}

/// The result of [`crate::assemble`].
#[derive(Clone, Debug, PartialEq)]
pub struct AssembleResult {
    pub success: bool,
    pub machine_code: BTreeMap<u16, u16>,
    pub labels: LabelMap,
    pub usage: BTreeMap<u16, Usage>,
    pub start_address: u16,
    pub errors: Vec<AssembleError>,
}

pub fn assemble(source: &str) -> AssembleResult {
    let pass1 = run_pass1(source);

    if !pass1.errors.is_empty() {
        return AssembleResult {
            success: false,
            machine_code: BTreeMap::new(),
            labels: pass1.labels,
            usage: BTreeMap::new(),
            start_address: pass1.start_address,
            errors: pass1.errors,
        };
    }

    let (machine_code, usage, errors) = run_pass2(&pass1);
    let success = errors.is_empty();

    AssembleResult {
        success,
        machine_code: if success {
            machine_code
        } else {
            BTreeMap::new()
        },
        labels: pass1.labels,
        usage,
        start_address: pass1.start_address,
        errors,
    }
}
