use as6809::{assemble, AsmError, Assembler, Pos};
use pretty_assertions::assert_eq;

fn err(source: &str) -> AsmError {
    match assemble(source, 0x4000) {
        Ok(bytes) => panic!("assembled to {bytes:02X?}"),
        Err(e) => e,
    }
}

#[test]
fn unresolved_operand() {
    assert_eq!(
        err("nop\n  jmp nowhere\n"),
        AsmError::Unresolved {
            pos: Pos { line: 2, column: 7 },
            name: "nowhere".into()
        }
    );
}

#[test]
fn constants_cannot_reference_later_names() {
    let e = err("const a=b\nconst b=1\n");
    assert!(matches!(e, AsmError::Unresolved { ref name, .. } if name == "b"));
    let e = err("size equ end1-start\nstart: nop\nend1: nop\n");
    assert!(matches!(e, AsmError::Unresolved { ref name, .. } if name == "end1"));
}

#[test]
fn redefinitions() {
    assert!(matches!(err("x: nop\nx: nop\n"), AsmError::Syntax { .. }));
    assert!(matches!(err("n equ 1\nn equ 2\n"), AsmError::Syntax { .. }));

    let mut asm = Assembler::new();
    asm.define("n", 1);
    assert!(matches!(asm.assemble("n equ 2"), Err(AsmError::Syntax { .. })));
}

#[test]
fn labels_and_constants_may_share_a_name() {
    let mut asm = Assembler::new();
    let bytes = asm.assemble("n equ 5\nn: lda #n\n").unwrap();
    assert_eq!(bytes, [0x86, 0x05]);
    assert_eq!(asm.labels()["n"].value, 0x4000);
}

#[test]
fn syntax_errors() {
    assert!(matches!(err("mov a,b"), AsmError::Syntax { .. }));
    assert!(matches!(err("lda #1 2"), AsmError::Syntax { .. }));
    assert!(matches!(err(", nop"), AsmError::Syntax { .. }));
    assert!(matches!(err("lda ,q"), AsmError::Syntax { .. }));
    assert!(matches!(err("lda [5,x"), AsmError::Syntax { .. }));
    assert!(matches!(err("fill 1"), AsmError::Syntax { .. }));
    assert!(matches!(err("equ 5"), AsmError::Syntax { .. }));
}

#[test]
fn invalid_characters_are_reported_where_reached() {
    assert_eq!(
        err("nop\nlda #1 @\n"),
        AsmError::Syntax {
            pos: Pos { line: 2, column: 8 },
            msg: "invalid token `@`".into()
        }
    );
    assert!(matches!(err("fcc \"open\n"), AsmError::Syntax { .. }));
}

#[test]
fn messages_carry_positions() {
    assert_eq!(err("nop\n  lda #300").to_string(), "2:7: byte out of range: 300");
    assert_eq!(
        err("bra far\nrmb 200\nfar: rts").to_string(),
        "1:5: branch out of range: 200"
    );
    assert_eq!(
        err("sta #1").to_string(),
        "1:5: sta does not support immediate addressing"
    );
}

#[test]
fn first_error_aborts() {
    let e = err("lda #300\njmp nowhere\n");
    assert!(matches!(e, AsmError::Range { .. }));
    assert_eq!(e.pos(), Pos { line: 1, column: 5 });
}

#[test]
fn labels_must_not_move_between_passes() {
    // `foo` resolves to the label in the first pass and to the later constant
    // in the second, so the pcr operand grows by a byte.
    let e = err("foo: nop\nleax foo,pcr\nbar: rts\nconst foo=5\n");
    assert_eq!(
        e,
        AsmError::Phase {
            pos: Pos { line: 3, column: 1 },
            name: "bar".into(),
            expected: 0x4004,
            found: 0x4005,
        }
    );
}
