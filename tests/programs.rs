use as6809::{assemble, Assembler};
use pretty_assertions::assert_eq;

const HELLO_WORLD: &str = r#"
    start:
        leay helloworld,pcr
        jsr print
        rts

    const textscreenbase=$400

    print:
        pshs a,x,y
        ldx #textscreenbase
    printloop:
        lda ,y+
        beq printover
        cmpa #$40
        bhs print6847
        adda #$40
    print6847:
        sta ,x+
        bra printloop
    printover:
        puls a,x,y
        rts


    helloworld:
        fcb "HELLO WORLD",0
"#;

const HELLO_WORLD_BYTES: &[u8] = &[
    0x31, 0x8D, 0x00, 0x1A, 0xBD, 0x40, 0x08, 0x39, 0x34, 0x32, 0x8E, 0x04, 0x00, 0xA6, 0xA0,
    0x27, 0x0A, 0x81, 0x40, 0x24, 0x02, 0x8B, 0x40, 0xA7, 0x80, 0x20, 0xF2, 0x35, 0x32, 0x39,
    0x48, 0x45, 0x4C, 0x4C, 0x4F, 0x20, 0x57, 0x4F, 0x52, 0x4C, 0x44, 0x00,
];

#[test]
fn hello_world() {
    assert_eq!(assemble(HELLO_WORLD, 0x4000).unwrap(), HELLO_WORLD_BYTES);
}

#[test]
fn case_insensitive() {
    assert_eq!(
        assemble(&HELLO_WORLD.to_uppercase(), 0x4000).unwrap(),
        HELLO_WORLD_BYTES
    );
}

#[test]
fn hello_world_labels() {
    let mut asm = Assembler::new();
    asm.assemble(HELLO_WORLD).unwrap();
    let labels = asm
        .labels()
        .iter()
        .map(|(name, sym)| (name.as_str(), sym.value))
        .collect::<Vec<_>>();
    assert_eq!(
        labels,
        [
            ("start", 0x4000),
            ("print", 0x4008),
            ("printloop", 0x400D),
            ("print6847", 0x4017),
            ("printover", 0x401B),
            ("helloworld", 0x401E),
        ]
    );
    assert_eq!(asm.consts()["textscreenbase"].value, 0x400);
}

#[test]
fn clear_screen() {
    let source = "
const graphicsBase=$600, gLineBytes=$20

start:
    ldd #$0210       ; select 16 colour graphics mode
    swi3
    bsr refreshScreen
    bsr clearScreen
    rts


refreshScreen:
    pshs d,x,y
    ldx #graphicsBase
    ldy #$0600
refreshS1:
    tst ,x+
    tst ,x+
    tst ,x+
    tst ,x+
    leay -1,y
    bne refreshS1
    puls d,x,y,pc


clearScreen:
    pshs d,x,y
    ldx #graphicsBase
    ldd #0
    ldy #$0600
clearS1:
    std ,x++
    std ,x++
    leay -1,y
    bne clearS1
    puls d,x,y,pc
";
    assert_eq!(
        assemble(source, 0x4000).unwrap(),
        [
            0xCC, 0x02, 0x10, 0x11, 0x3F, 0x8D, 0x03, 0x8D, 0x18, 0x39, 0x34, 0x36, 0x8E, 0x06,
            0x00, 0x10, 0x8E, 0x06, 0x00, 0x6D, 0x80, 0x6D, 0x80, 0x6D, 0x80, 0x6D, 0x80, 0x31,
            0x3F, 0x26, 0xF4, 0x35, 0xB6, 0x34, 0x36, 0x8E, 0x06, 0x00, 0xCC, 0x00, 0x00, 0x10,
            0x8E, 0x06, 0x00, 0xED, 0x81, 0xED, 0x81, 0x31, 0x3F, 0x26, 0xF8, 0x35, 0xB6
        ]
    );
}

#[test]
fn character_set() {
    let source = "
; Display the character set
; from 0 to 255

start:
    jsr displayAllChars
    rts

const textScreenBase=$0400

displayAllChars:
    lda #0
    ldx #textScreenBase
displayLoop:
    sta ,x+
    inca
    bne displayLoop
    rts
";
    assert_eq!(
        assemble(source, 0x4000).unwrap(),
        [0xBD, 0x40, 0x04, 0x39, 0x86, 0x00, 0x8E, 0x04, 0x00, 0xA7, 0x80, 0x4C, 0x26, 0xFB, 0x39]
    );
}

#[test]
fn reassembling_is_idempotent() {
    let mut asm = Assembler::new();
    let first = asm.assemble(HELLO_WORLD).unwrap();
    let second = asm.assemble(HELLO_WORLD).unwrap();
    assert_eq!(first, second);
    assert_eq!(asm.labels().len(), 6);
}

#[test]
fn base_address_moves_absolute_references() {
    let bytes = assemble(HELLO_WORLD, 0x2000).unwrap();
    assert_eq!(&bytes[..7], [0x31, 0x8D, 0x00, 0x1A, 0xBD, 0x20, 0x08]);
    assert_eq!(bytes.len(), HELLO_WORLD_BYTES.len());
}

#[test]
fn predefined_constants() {
    let mut asm = Assembler::with_base(0x1000);
    asm.define("SCREEN", 0x0400);
    let bytes = asm.assemble("ldx #screen\nstx <$10").unwrap();
    assert_eq!(bytes, [0x8E, 0x04, 0x00, 0x9F, 0x10]);
    assert_eq!(asm.base(), 0x1000);
}
