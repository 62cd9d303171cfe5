//! 256-entry-per-variant pipeline tables.
//!
//! Grounded on the teacher's microcode-table construction (`cpu-m68k`
//! builds one dispatch table and overlays variant quirks at the call site)
//! but adapted to the 6502 family's four-variant shape described in
//! `spec.md` Section 4.4: a shared documented base, an NMOS-illegal
//! overlay, an NMOS-legal-only overlay (illegal slots become NOPs), and a
//! CMOS base (WDC/Rockwell) with its own extensions and bit-manipulation
//! opcodes. Each opcode's micro-op sequence is built once, at first use,
//! and shared for the process's lifetime — `spec.md`'s invariant that
//! pipeline tables are "variant-wide, process-wide" immutable data.
//!
//! Construction rule (`spec.md` 4.4): every table entry's length equals the
//! documented base cycle count for that opcode on that variant. Runtime
//! penalties (page-crossing, decimal mode, branch-taken) are never baked in
//! here — they are spliced into the *working* pipeline by the micro-ops
//! themselves (see `microop.rs`).

use std::sync::OnceLock;

use crate::microop::{
    AccumulatorOp, AluOp, Cond, ImpliedOp, IndexReg, LoadTarget, MicroOp, PageCrossPenalty,
    RmwOp, StoreSource,
};
use crate::pipeline::Pipeline;
use crate::variant::Variant;

use MicroOp::{
    AccumulatorApply, BbrFetchOffset, BbsFetchOffset, BbrBbsBranch, BranchFetchOffset,
    BrkPadding, DummyReadApplyRmw, DummyWriteApplyRmw, FetchAddrHigh, FetchAddrHighIndexed,
    FetchAddrLow, FetchIndirectHigh, FetchIndirectHighIndexedY, FetchIndirectLow, FetchOpcode,
    FetchPointer, FetchPointerIndexedDummyRead, FetchZpAddr, FetchZpIndexed, FetchZpPointerHigh,
    FetchZpPointerLow, ImmediateApplyAlu, ImmediateLoad, ImpliedDummyRead, Jam, JamLatch,
    JamRead, JmpAbsCommit, JmpIdxAddXDummy, JmpIdxFetchHigh, JmpIdxReadHighCommit,
    JmpIdxReadLow, JmpIndCmosExtraCycle, JmpIndReadHighCommitCmos, JmpIndReadHighCommitNmos,
    JmpIndReadLow, JsrInternalDummy, JsrPushPch, JsrPushPcl, JsrReadHighJump, JsrReadLow,
    NopFill, PageCrossDummyReadUnconditional, PullA, PullP, PullPcHigh, PullPcLow, PullX,
    PullY, PushA, PushP, PushPch, PushPcl, PushStatusBrkSetI, PushStatusBrkSetIClearD, PushX,
    PushY, ReadApplyAlu, ReadForRmw, ReadLoad, ReadVectorHigh, ReadVectorHighSetI,
    ReadVectorLow, RmbApply, RtsFixupPc, SmbApply, StackDummyRead, Stp, Wai, WriteRmwFinal,
    WriteStore,
};

const CAP: usize = crate::pipeline::PIPELINE_CAPACITY;

/// Copies `ops` into a fixed buffer, pads the remainder up to `total` with
/// [`MicroOp::NopFill`], and builds a [`Pipeline`] of length `total`. Used
/// both for genuine multi-byte NOPs and to give a former-illegal opcode's
/// NOP-ified replacement the same cycle count as the illegal behavior it
/// replaces, without needing a bespoke sequence for every addressing mode.
const fn pad_nop(ops: &[MicroOp], total: usize) -> Pipeline {
    let mut buf = [MicroOp::NopFill; CAP];
    let mut i = 0;
    while i < ops.len() {
        buf[i] = ops[i];
        i += 1;
    }
    while i < total {
        buf[i] = MicroOp::NopFill;
        i += 1;
    }
    Pipeline::new(slice_to(&buf, total))
}

/// `&buf[..len]` as a const fn (slicing syntax is not yet usable on a
/// `const` binding inside every context this module needs it in).
const fn slice_to(buf: &[MicroOp; CAP], len: usize) -> &[MicroOp] {
    let (head, _) = buf.split_at(len);
    head
}

// ---------------------------------------------------------------------
// Addressing-mode pipeline builders. Each returns a table entry whose
// length is the *documented* (unpenalized) cycle count; runtime-dependent
// extra cycles are spliced in by the micro-ops themselves.
// ---------------------------------------------------------------------

const fn imm_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, ImmediateApplyAlu(op)])
}
const fn zp_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, ReadApplyAlu(op)])
}
const fn zpidx_alu(op: AluOp, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, FetchZpIndexed(idx), ReadApplyAlu(op)])
}
const fn abs_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchAddrLow, FetchAddrHigh, ReadApplyAlu(op)])
}
const fn absidx_alu(op: AluOp, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHighIndexed(idx, PageCrossPenalty::Conditional),
        ReadApplyAlu(op),
    ])
}
const fn izx_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchPointerIndexedDummyRead,
        FetchIndirectLow,
        FetchIndirectHigh,
        ReadApplyAlu(op),
    ])
}
const fn izy_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchIndirectLow,
        FetchIndirectHighIndexedY(PageCrossPenalty::Conditional),
        ReadApplyAlu(op),
    ])
}
/// CMOS-only `(zp)` addressing (no index): ORA/AND/EOR/ADC/LDA/CMP/SBC.
const fn zpind_alu(op: AluOp) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchZpPointerLow,
        FetchZpPointerHigh,
        ReadApplyAlu(op),
    ])
}

const fn imm_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[FetchOpcode, ImmediateLoad(t)])
}
const fn zp_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, ReadLoad(t)])
}
const fn zpidx_load(t: LoadTarget, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, FetchZpIndexed(idx), ReadLoad(t)])
}
const fn abs_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchAddrLow, FetchAddrHigh, ReadLoad(t)])
}
const fn absidx_load(t: LoadTarget, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHighIndexed(idx, PageCrossPenalty::Conditional),
        ReadLoad(t),
    ])
}
const fn izx_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchPointerIndexedDummyRead,
        FetchIndirectLow,
        FetchIndirectHigh,
        ReadLoad(t),
    ])
}
const fn izy_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchIndirectLow,
        FetchIndirectHighIndexedY(PageCrossPenalty::Conditional),
        ReadLoad(t),
    ])
}
const fn zpind_load(t: LoadTarget) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchZpPointerLow,
        FetchZpPointerHigh,
        ReadLoad(t),
    ])
}

const fn zp_store(s: StoreSource) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, WriteStore(s)])
}
const fn zpidx_store(s: StoreSource, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, FetchZpIndexed(idx), WriteStore(s)])
}
const fn abs_store(s: StoreSource) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchAddrLow, FetchAddrHigh, WriteStore(s)])
}
/// Stores always pay the indexed-addressing penalty cycle, page crossed or
/// not (`spec.md` 4.3 `add_x_with_dummy_read`).
const fn absidx_store(s: StoreSource, idx: IndexReg) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHighIndexed(idx, PageCrossPenalty::AlreadyUnconditional),
        PageCrossDummyReadUnconditional,
        WriteStore(s),
    ])
}
const fn izx_store(s: StoreSource) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchPointerIndexedDummyRead,
        FetchIndirectLow,
        FetchIndirectHigh,
        WriteStore(s),
    ])
}
const fn izy_store(s: StoreSource) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchIndirectLow,
        FetchIndirectHighIndexedY(PageCrossPenalty::AlreadyUnconditional),
        PageCrossDummyReadUnconditional,
        WriteStore(s),
    ])
}
const fn zpind_store(s: StoreSource) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchZpPointerLow,
        FetchZpPointerHigh,
        WriteStore(s),
    ])
}

/// `dummy_write`: NMOS silicon writes the unmodified byte back before the
/// final write; CMOS replaces that with a dummy read (`spec.md` 1 "dummy-
/// read vs dummy-write on RMW").
const fn rmw_dummy(op: RmwOp, dummy_write: bool) -> MicroOp {
    if dummy_write {
        DummyWriteApplyRmw(op)
    } else {
        DummyReadApplyRmw(op)
    }
}
const fn zp_rmw(op: RmwOp, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchZpAddr,
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}
const fn zpidx_rmw(op: RmwOp, idx: IndexReg, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchZpAddr,
        FetchZpIndexed(idx),
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}
const fn abs_rmw(op: RmwOp, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHigh,
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}
const fn absidx_rmw(op: RmwOp, idx: IndexReg, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHighIndexed(idx, PageCrossPenalty::AlreadyUnconditional),
        PageCrossDummyReadUnconditional,
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}
const fn izx_rmw(op: RmwOp, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchPointerIndexedDummyRead,
        FetchIndirectLow,
        FetchIndirectHigh,
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}
const fn izy_rmw(op: RmwOp, dummy_write: bool) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchPointer,
        FetchIndirectLow,
        FetchIndirectHighIndexedY(PageCrossPenalty::AlreadyUnconditional),
        PageCrossDummyReadUnconditional,
        ReadForRmw,
        rmw_dummy(op, dummy_write),
        WriteRmwFinal,
    ])
}

const fn accumulator(op: AccumulatorOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, AccumulatorApply(op)])
}
const fn implied(op: ImpliedOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, ImpliedDummyRead(op)])
}
const fn branch(cond: Cond) -> Pipeline {
    Pipeline::new(&[FetchOpcode, BranchFetchOffset(cond)])
}
const fn push(op: MicroOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, NopFill, op])
}
const fn pull(op: MicroOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, NopFill, StackDummyRead, op])
}
const fn rmb_smb(bit_op: MicroOp) -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, ReadForRmw, bit_op, WriteRmwFinal])
}
const fn bbx(fetch_offset: MicroOp) -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchZpAddr,
        ReadForRmw,
        fetch_offset,
        BbrBbsBranch,
    ])
}

// ---------------------------------------------------------------------
// NOPs of the byte-length / cycle-count the illegal-opcode reference
// tables document. `FetchZpAddr`/`FetchAddrLow`+`FetchAddrHigh` consume the
// right number of operand bytes; `ReadForRmw` performs the read a real
// zero-page/absolute NOP is documented to make; remaining cycles are
// internal (`NopFill`, a repeated discarded read of the current PC).
// ---------------------------------------------------------------------

const fn nop_implied() -> Pipeline {
    Pipeline::new(&[FetchOpcode, NopFill])
}
const fn nop_imm() -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr])
}
const fn nop_zp() -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, ReadForRmw])
}
const fn nop_zpx() -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchZpAddr, FetchZpIndexed(IndexReg::X), ReadForRmw])
}
const fn nop_abs() -> Pipeline {
    Pipeline::new(&[FetchOpcode, FetchAddrLow, FetchAddrHigh, ReadForRmw])
}
const fn nop_absx() -> Pipeline {
    Pipeline::new(&[
        FetchOpcode,
        FetchAddrLow,
        FetchAddrHighIndexed(IndexReg::X, PageCrossPenalty::Conditional),
        ReadForRmw,
    ])
}

// ---------------------------------------------------------------------
// The shared documented base: every opcode official on *both* NMOS and
// CMOS silicon. `cmos` selects the ADC/SBC flavor (binary-vs-decimal N/Z/V
// semantics differ, `spec.md` 4.3) and the JMP-indirect behavior (the
// page-wrap bug vs its CMOS fix) and whether BRK additionally clears D.
// ---------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
const fn documented_opcode(opcode: u8, cmos: bool) -> Option<Pipeline> {
    let adc = if cmos { AluOp::AdcCmos } else { AluOp::AdcNmos };
    let sbc = if cmos { AluOp::SbcCmos } else { AluOp::SbcNmos };
    use IndexReg::{X, Y};

    Some(match opcode {
        // ---- ORA ----
        0x09 => imm_alu(AluOp::Ora),
        0x05 => zp_alu(AluOp::Ora),
        0x15 => zpidx_alu(AluOp::Ora, X),
        0x0D => abs_alu(AluOp::Ora),
        0x1D => absidx_alu(AluOp::Ora, X),
        0x19 => absidx_alu(AluOp::Ora, Y),
        0x01 => izx_alu(AluOp::Ora),
        0x11 => izy_alu(AluOp::Ora),

        // ---- AND ----
        0x29 => imm_alu(AluOp::And),
        0x25 => zp_alu(AluOp::And),
        0x35 => zpidx_alu(AluOp::And, X),
        0x2D => abs_alu(AluOp::And),
        0x3D => absidx_alu(AluOp::And, X),
        0x39 => absidx_alu(AluOp::And, Y),
        0x21 => izx_alu(AluOp::And),
        0x31 => izy_alu(AluOp::And),

        // ---- EOR ----
        0x49 => imm_alu(AluOp::Eor),
        0x45 => zp_alu(AluOp::Eor),
        0x55 => zpidx_alu(AluOp::Eor, X),
        0x4D => abs_alu(AluOp::Eor),
        0x5D => absidx_alu(AluOp::Eor, X),
        0x59 => absidx_alu(AluOp::Eor, Y),
        0x41 => izx_alu(AluOp::Eor),
        0x51 => izy_alu(AluOp::Eor),

        // ---- ADC ----
        0x69 => imm_alu(adc),
        0x65 => zp_alu(adc),
        0x75 => zpidx_alu(adc, X),
        0x6D => abs_alu(adc),
        0x7D => absidx_alu(adc, X),
        0x79 => absidx_alu(adc, Y),
        0x61 => izx_alu(adc),
        0x71 => izy_alu(adc),

        // ---- SBC ----
        0xE9 => imm_alu(sbc),
        0xE5 => zp_alu(sbc),
        0xF5 => zpidx_alu(sbc, X),
        0xED => abs_alu(sbc),
        0xFD => absidx_alu(sbc, X),
        0xF9 => absidx_alu(sbc, Y),
        0xE1 => izx_alu(sbc),
        0xF1 => izy_alu(sbc),

        // ---- CMP/CPX/CPY ----
        0xC9 => imm_alu(AluOp::Cmp),
        0xC5 => zp_alu(AluOp::Cmp),
        0xD5 => zpidx_alu(AluOp::Cmp, X),
        0xCD => abs_alu(AluOp::Cmp),
        0xDD => absidx_alu(AluOp::Cmp, X),
        0xD9 => absidx_alu(AluOp::Cmp, Y),
        0xC1 => izx_alu(AluOp::Cmp),
        0xD1 => izy_alu(AluOp::Cmp),
        0xE0 => imm_alu(AluOp::Cpx),
        0xE4 => zp_alu(AluOp::Cpx),
        0xEC => abs_alu(AluOp::Cpx),
        0xC0 => imm_alu(AluOp::Cpy),
        0xC4 => zp_alu(AluOp::Cpy),
        0xCC => abs_alu(AluOp::Cpy),

        // ---- BIT (documented: zp/abs only; CMOS adds imm/zpx/absx) ----
        0x24 => zp_alu(AluOp::Bit),
        0x2C => abs_alu(AluOp::Bit),

        // ---- LDA/LDX/LDY ----
        0xA9 => imm_load(LoadTarget::A),
        0xA5 => zp_load(LoadTarget::A),
        0xB5 => zpidx_load(LoadTarget::A, X),
        0xAD => abs_load(LoadTarget::A),
        0xBD => absidx_load(LoadTarget::A, X),
        0xB9 => absidx_load(LoadTarget::A, Y),
        0xA1 => izx_load(LoadTarget::A),
        0xB1 => izy_load(LoadTarget::A),
        0xA2 => imm_load(LoadTarget::X),
        0xA6 => zp_load(LoadTarget::X),
        0xB6 => zpidx_load(LoadTarget::X, Y),
        0xAE => abs_load(LoadTarget::X),
        0xBE => absidx_load(LoadTarget::X, Y),
        0xA0 => imm_load(LoadTarget::Y),
        0xA4 => zp_load(LoadTarget::Y),
        0xB4 => zpidx_load(LoadTarget::Y, X),
        0xAC => abs_load(LoadTarget::Y),
        0xBC => absidx_load(LoadTarget::Y, X),

        // ---- STA/STX/STY ----
        0x85 => zp_store(StoreSource::A),
        0x95 => zpidx_store(StoreSource::A, X),
        0x8D => abs_store(StoreSource::A),
        0x9D => absidx_store(StoreSource::A, X),
        0x99 => absidx_store(StoreSource::A, Y),
        0x81 => izx_store(StoreSource::A),
        0x91 => izy_store(StoreSource::A),
        0x86 => zp_store(StoreSource::X),
        0x96 => zpidx_store(StoreSource::X, Y),
        0x8E => abs_store(StoreSource::X),
        0x84 => zp_store(StoreSource::Y),
        0x94 => zpidx_store(StoreSource::Y, X),
        0x8C => abs_store(StoreSource::Y),

        // ---- ASL/LSR/ROL/ROR ----
        0x0A => accumulator(AccumulatorOp::Asl),
        0x06 => zp_rmw(RmwOp::Asl, !cmos),
        0x16 => zpidx_rmw(RmwOp::Asl, X, !cmos),
        0x0E => abs_rmw(RmwOp::Asl, !cmos),
        0x1E => absidx_rmw(RmwOp::Asl, X, !cmos),
        0x4A => accumulator(AccumulatorOp::Lsr),
        0x46 => zp_rmw(RmwOp::Lsr, !cmos),
        0x56 => zpidx_rmw(RmwOp::Lsr, X, !cmos),
        0x4E => abs_rmw(RmwOp::Lsr, !cmos),
        0x5E => absidx_rmw(RmwOp::Lsr, X, !cmos),
        0x2A => accumulator(AccumulatorOp::Rol),
        0x26 => zp_rmw(RmwOp::Rol, !cmos),
        0x36 => zpidx_rmw(RmwOp::Rol, X, !cmos),
        0x2E => abs_rmw(RmwOp::Rol, !cmos),
        0x3E => absidx_rmw(RmwOp::Rol, X, !cmos),
        0x6A => accumulator(AccumulatorOp::Ror),
        0x66 => zp_rmw(RmwOp::Ror, !cmos),
        0x76 => zpidx_rmw(RmwOp::Ror, X, !cmos),
        0x6E => abs_rmw(RmwOp::Ror, !cmos),
        0x7E => absidx_rmw(RmwOp::Ror, X, !cmos),

        // ---- INC/DEC (memory) ----
        0xE6 => zp_rmw(RmwOp::Inc, !cmos),
        0xF6 => zpidx_rmw(RmwOp::Inc, X, !cmos),
        0xEE => abs_rmw(RmwOp::Inc, !cmos),
        0xFE => absidx_rmw(RmwOp::Inc, X, !cmos),
        0xC6 => zp_rmw(RmwOp::Dec, !cmos),
        0xD6 => zpidx_rmw(RmwOp::Dec, X, !cmos),
        0xCE => abs_rmw(RmwOp::Dec, !cmos),
        0xDE => absidx_rmw(RmwOp::Dec, X, !cmos),

        // ---- register transfers / increments / decrements ----
        0xAA => implied(ImpliedOp::Tax),
        0xA8 => implied(ImpliedOp::Tay),
        0x8A => implied(ImpliedOp::Txa),
        0x98 => implied(ImpliedOp::Tya),
        0xBA => implied(ImpliedOp::Tsx),
        0x9A => implied(ImpliedOp::Txs),
        0xE8 => implied(ImpliedOp::Inx),
        0xC8 => implied(ImpliedOp::Iny),
        0xCA => implied(ImpliedOp::Dex),
        0x88 => implied(ImpliedOp::Dey),
        0xEA => implied(ImpliedOp::Nop),

        // ---- flags ----
        0x18 => implied(ImpliedOp::ClearFlag(crate::flags::C)),
        0x38 => implied(ImpliedOp::SetFlag(crate::flags::C)),
        0x58 => implied(ImpliedOp::ClearFlag(crate::flags::I)),
        0x78 => implied(ImpliedOp::SetFlag(crate::flags::I)),
        0xD8 => implied(ImpliedOp::ClearFlag(crate::flags::D)),
        0xF8 => implied(ImpliedOp::SetFlag(crate::flags::D)),
        0xB8 => implied(ImpliedOp::ClearFlag(crate::flags::V)),

        // ---- branches ----
        0x90 => branch(Cond::CarryClear),
        0xB0 => branch(Cond::CarrySet),
        0xF0 => branch(Cond::ZeroSet),
        0xD0 => branch(Cond::ZeroClear),
        0x30 => branch(Cond::NegativeSet),
        0x10 => branch(Cond::NegativeClear),
        0x50 => branch(Cond::OverflowClear),
        0x70 => branch(Cond::OverflowSet),

        // ---- stack ----
        0x48 => push(PushA),
        0x08 => push(PushP),
        0x68 => pull(PullA),
        0x28 => pull(PullP),

        // ---- jumps / calls ----
        0x4C => Pipeline::new(&[FetchOpcode, FetchAddrLow, JmpAbsCommit]),
        0x6C => {
            if cmos {
                Pipeline::new(&[
                    FetchOpcode,
                    FetchAddrLow,
                    FetchAddrHigh,
                    JmpIndReadLow,
                    JmpIndCmosExtraCycle,
                    JmpIndReadHighCommitCmos,
                ])
            } else {
                Pipeline::new(&[
                    FetchOpcode,
                    FetchAddrLow,
                    FetchAddrHigh,
                    JmpIndReadLow,
                    JmpIndReadHighCommitNmos,
                ])
            }
        }
        0x20 => Pipeline::new(&[
            FetchOpcode,
            JsrReadLow,
            JsrInternalDummy,
            JsrPushPch,
            JsrPushPcl,
            JsrReadHighJump,
        ]),
        0x60 => Pipeline::new(&[FetchOpcode, NopFill, StackDummyRead, PullPcLow, PullPcHigh, RtsFixupPc]),
        0x40 => Pipeline::new(&[FetchOpcode, NopFill, StackDummyRead, PullP, PullPcLow, PullPcHigh]),
        0x00 => {
            if cmos {
                Pipeline::new(&[
                    FetchOpcode,
                    BrkPadding,
                    PushPch,
                    PushPcl,
                    PushStatusBrkSetIClearD,
                    ReadVectorLow,
                    ReadVectorHigh,
                ])
            } else {
                Pipeline::new(&[
                    FetchOpcode,
                    BrkPadding,
                    PushPch,
                    PushPcl,
                    PushStatusBrkSetI,
                    ReadVectorLow,
                    ReadVectorHigh,
                ])
            }
        }

        _ => return None,
    })
}

/// The hardware NMI/IRQ service sequence installed by the engine's
/// interrupt poll (not reachable via opcode lookup). Identical shape to
/// BRK's push/vector tail, but the two leading cycles are dummy
/// instruction-stream reads rather than a real opcode+signature fetch
/// (`spec.md` 4.6). The caller sets `state.interrupt_vector` beforehand.
#[must_use]
pub const fn irq_nmi_pipeline(cmos: bool) -> Pipeline {
    if cmos {
        Pipeline::new(&[
            MicroOp::InterruptDummyRead,
            MicroOp::InterruptDummyRead,
            PushPch,
            PushPcl,
            MicroOp::PushStatusHardwareSetIClearD,
            ReadVectorLow,
            ReadVectorHigh,
        ])
    } else {
        Pipeline::new(&[
            MicroOp::InterruptDummyRead,
            MicroOp::InterruptDummyRead,
            PushPch,
            PushPcl,
            MicroOp::PushStatusHardwareSetI,
            ReadVectorLow,
            ReadVectorHigh,
        ])
    }
}

/// The in-band reset sequence (`spec.md` 9, "if cycle-exact reset is
/// needed, model the three suppressed-push dummy reads explicitly"). Used
/// only when a running CPU is asked to reset via [`crate::Cpu::signal_reset`]
/// and services it at the next instruction boundary; [`crate::Cpu::reset`]
/// itself bypasses the pipeline entirely and loads the vector directly.
#[must_use]
pub const fn reset_pipeline() -> Pipeline {
    Pipeline::new(&[
        MicroOp::InterruptDummyRead,
        MicroOp::InterruptDummyRead,
        MicroOp::ResetDummyPush,
        MicroOp::ResetDummyPush,
        MicroOp::ResetDummyPush,
        ReadVectorLow,
        ReadVectorHighSetI,
    ])
}

// ---------------------------------------------------------------------
// NMOS illegal/undocumented opcodes (full behavior), grounded on the
// widely corroborated "Oxyron"/NESdev illegal-opcode reference tables.
// ---------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
const fn nmos_illegal_opcode(opcode: u8) -> Option<Pipeline> {
    use IndexReg::{X, Y};
    use RmwOp::{Dcp, Isc, Rla, Rra, Slo, Sre};

    Some(match opcode {
        // SLO
        0x03 => izx_rmw(Slo, true),
        0x07 => zp_rmw(Slo, true),
        0x0F => abs_rmw(Slo, true),
        0x13 => izy_rmw(Slo, true),
        0x17 => zpidx_rmw(Slo, X, true),
        0x1B => absidx_rmw(Slo, Y, true),
        0x1F => absidx_rmw(Slo, X, true),
        // RLA
        0x23 => izx_rmw(Rla, true),
        0x27 => zp_rmw(Rla, true),
        0x2F => abs_rmw(Rla, true),
        0x33 => izy_rmw(Rla, true),
        0x37 => zpidx_rmw(Rla, X, true),
        0x3B => absidx_rmw(Rla, Y, true),
        0x3F => absidx_rmw(Rla, X, true),
        // SRE
        0x43 => izx_rmw(Sre, true),
        0x47 => zp_rmw(Sre, true),
        0x4F => abs_rmw(Sre, true),
        0x53 => izy_rmw(Sre, true),
        0x57 => zpidx_rmw(Sre, X, true),
        0x5B => absidx_rmw(Sre, Y, true),
        0x5F => absidx_rmw(Sre, X, true),
        // RRA
        0x63 => izx_rmw(Rra, true),
        0x67 => zp_rmw(Rra, true),
        0x6F => abs_rmw(Rra, true),
        0x73 => izy_rmw(Rra, true),
        0x77 => zpidx_rmw(Rra, X, true),
        0x7B => absidx_rmw(Rra, Y, true),
        0x7F => absidx_rmw(Rra, X, true),
        // SAX
        0x83 => izx_store(StoreSource::Ax),
        0x87 => zp_store(StoreSource::Ax),
        0x8F => abs_store(StoreSource::Ax),
        0x97 => zpidx_store(StoreSource::Ax, Y),
        // LAX
        0xA3 => izx_load(LoadTarget::Ax),
        0xA7 => zp_load(LoadTarget::Ax),
        0xAF => abs_load(LoadTarget::Ax),
        0xB3 => izy_load(LoadTarget::Ax),
        0xB7 => zpidx_load(LoadTarget::Ax, Y),
        0xBF => absidx_load(LoadTarget::Ax, Y),
        // DCP
        0xC3 => izx_rmw(Dcp, true),
        0xC7 => zp_rmw(Dcp, true),
        0xCF => abs_rmw(Dcp, true),
        0xD3 => izy_rmw(Dcp, true),
        0xD7 => zpidx_rmw(Dcp, X, true),
        0xDB => absidx_rmw(Dcp, Y, true),
        0xDF => absidx_rmw(Dcp, X, true),
        // ISC/ISB
        0xE3 => izx_rmw(Isc, true),
        0xE7 => zp_rmw(Isc, true),
        0xEF => abs_rmw(Isc, true),
        0xF3 => izy_rmw(Isc, true),
        0xF7 => zpidx_rmw(Isc, X, true),
        0xFB => absidx_rmw(Isc, Y, true),
        0xFF => absidx_rmw(Isc, X, true),

        // ANC, ALR, ARR, ANE, LXA, AXS, duplicate SBC
        0x0B | 0x2B => imm_alu(AluOp::Anc),
        0x4B => imm_alu(AluOp::Alr),
        0x6B => imm_alu(AluOp::Arr),
        0x8B => imm_load(LoadTarget::Ax), // ANE/XAA: documented as hardware-unstable; approximated as A,X <- imm (spec.md 9)
        0xAB => imm_load(LoadTarget::Ax), // LXA: same approximation as ANE
        0xCB => imm_alu(AluOp::Axs),
        0xEB => imm_alu(AluOp::SbcNmos),

        // SHY/SHX/SHA/TAS/LAS (page-cross-unstable convention: spec.md 9)
        0x9C => absidx_store(StoreSource::ShyYh, X),
        0x9E => absidx_store(StoreSource::ShxXh, Y),
        0x9F => absidx_store(StoreSource::ShaAxH, Y),
        0x93 => izy_store(StoreSource::ShaAxH),
        0x9B => absidx_store(StoreSource::TasAxsH, Y),
        0xBB => absidx_load(LoadTarget::AxFromStack, Y),

        // NOPs (DOP/TOP)
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => nop_implied(),
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => nop_imm(),
        0x04 | 0x44 | 0x64 => nop_zp(),
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => nop_zpx(),
        0x0C => nop_abs(),
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => nop_absx(),

        // JAM/KIL: latches Jammed after the documented 10-cycle bus
        // pattern of alternating reads at $FFFF/$FFFE (spec.md 9, open
        // question — preserved verbatim to match known test vectors).
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
            Pipeline::new(&[
                FetchOpcode,
                JamRead(0xFFFF),
                JamRead(0xFFFE),
                JamRead(0xFFFF),
                JamRead(0xFFFE),
                JamRead(0xFFFF),
                JamRead(0xFFFE),
                JamRead(0xFFFF),
                JamRead(0xFFFE),
                JamLatch(0xFFFF),
            ])
        }

        _ => return None,
    })
}

/// `Nmos6502NoIllegal`: every slot [`nmos_illegal_opcode`] fills is instead
/// a NOP of the same documented byte-length and cycle count (`spec.md`
/// 4.4's "NMOS without illegal" overlay). The exact bus addresses touched
/// follow the conventional DOP/TOP NOP pattern rather than mimicking the
/// illegal opcode's own effective address — the spec constrains size and
/// cycle count only.
fn nmos_no_illegal_opcode(opcode: u8) -> Option<Pipeline> {
    let illegal = nmos_illegal_opcode(opcode)?;
    let len = illegal.len();
    Some(match opcode {
        // Already-NOP slots keep their shape untouched.
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA | 0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 | 0x04
        | 0x44 | 0x64 | 0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 | 0x0C | 0x1C | 0x3C | 0x5C
        | 0x7C | 0xDC | 0xFC => illegal,

        // Immediate-addressed combo ops: 2-byte/2-cycle NOP.
        0x0B | 0x2B | 0x4B | 0x6B | 0x8B | 0xAB | 0xCB | 0xEB => pad_nop(&[FetchOpcode, FetchZpAddr], len),

        // JAM: a plain 1-byte/2-cycle NOP instead of hanging.
        0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2 | 0xF2 => {
            nop_implied()
        }

        // Everything else (RMW combos, LAX/SAX, SHA/SHX/SHY/TAS/LAS) keeps
        // the same addressing-mode operand-fetch shape, consuming the same
        // number of bytes/cycles, with no memory write.
        _ => pad_nop(&[], len),
    })
}

// ---------------------------------------------------------------------
// CMOS extensions (shared by WDC and Rockwell): new opcodes filling
// former NMOS-illegal slots, plus RMB/SMB/BBR/BBS. `rockwell` selects
// whether WAI/STP ($CB/$DB) halt or behave as NOPs.
// ---------------------------------------------------------------------

#[allow(clippy::too_many_lines)]
const fn cmos_extension_opcode(opcode: u8, rockwell: bool) -> Option<Pipeline> {
    use IndexReg::{X, Y};

    Some(match opcode {
        // BRA
        0x80 => branch(Cond::Always),
        // PHX/PHY/PLX/PLY
        0xDA => push(PushX),
        0x5A => push(PushY),
        0xFA => pull(PullX),
        0x7A => pull(PullY),
        // INC A / DEC A
        0x1A => accumulator(AccumulatorOp::Inc),
        0x3A => accumulator(AccumulatorOp::Dec),
        // STZ
        0x64 => zp_store(StoreSource::Stz),
        0x74 => zpidx_store(StoreSource::Stz, X),
        0x9C => abs_store(StoreSource::Stz),
        0x9E => absidx_store(StoreSource::Stz, X),
        // TRB/TSB
        0x14 => zp_rmw(RmwOp::Trb, false),
        0x1C => abs_rmw(RmwOp::Trb, false),
        0x04 => zp_rmw(RmwOp::Tsb, false),
        0x0C => abs_rmw(RmwOp::Tsb, false),
        // BIT extensions
        0x89 => imm_alu(AluOp::BitImm),
        0x34 => zpidx_alu(AluOp::Bit, X),
        0x3C => absidx_alu(AluOp::Bit, X),
        // (zp) addressing
        0x12 => zpind_alu(AluOp::Ora),
        0x32 => zpind_alu(AluOp::And),
        0x52 => zpind_alu(AluOp::Eor),
        0x72 => zpind_alu(AluOp::AdcCmos),
        0xB2 => zpind_load(LoadTarget::A),
        0xD2 => zpind_alu(AluOp::Cmp),
        0xF2 => zpind_alu(AluOp::SbcCmos),
        0x92 => zpind_store(StoreSource::A),
        // JMP (abs,X)
        0x7C => Pipeline::new(&[
            FetchOpcode,
            FetchAddrLow,
            JmpIdxFetchHigh,
            JmpIdxAddXDummy,
            JmpIdxReadLow,
            JmpIdxReadHighCommit,
        ]),
        // WAI/STP (WDC, 3 cycles) or a 3-cycle NOP of the same length
        // (Rockwell, `spec.md` 8 variant property).
        0xCB => {
            if rockwell {
                Pipeline::new(&[FetchOpcode, NopFill, NopFill])
            } else {
                Pipeline::new(&[FetchOpcode, NopFill, Wai])
            }
        }
        0xDB => {
            if rockwell {
                Pipeline::new(&[FetchOpcode, NopFill, NopFill])
            } else {
                Pipeline::new(&[FetchOpcode, NopFill, Stp])
            }
        }

        // RMB/SMB
        0x07 => rmb_smb(RmbApply(0)),
        0x17 => rmb_smb(RmbApply(1)),
        0x27 => rmb_smb(RmbApply(2)),
        0x37 => rmb_smb(RmbApply(3)),
        0x47 => rmb_smb(RmbApply(4)),
        0x57 => rmb_smb(RmbApply(5)),
        0x67 => rmb_smb(RmbApply(6)),
        0x77 => rmb_smb(RmbApply(7)),
        0x87 => rmb_smb(SmbApply(0)),
        0x97 => rmb_smb(SmbApply(1)),
        0xA7 => rmb_smb(SmbApply(2)),
        0xB7 => rmb_smb(SmbApply(3)),
        0xC7 => rmb_smb(SmbApply(4)),
        0xD7 => rmb_smb(SmbApply(5)),
        0xE7 => rmb_smb(SmbApply(6)),
        0xF7 => rmb_smb(SmbApply(7)),
        // BBR/BBS
        0x0F => bbx(BbrFetchOffset(0)),
        0x1F => bbx(BbrFetchOffset(1)),
        0x2F => bbx(BbrFetchOffset(2)),
        0x3F => bbx(BbrFetchOffset(3)),
        0x4F => bbx(BbrFetchOffset(4)),
        0x5F => bbx(BbrFetchOffset(5)),
        0x6F => bbx(BbrFetchOffset(6)),
        0x7F => bbx(BbrFetchOffset(7)),
        0x8F => bbx(BbsFetchOffset(0)),
        0x9F => bbx(BbsFetchOffset(1)),
        0xAF => bbx(BbsFetchOffset(2)),
        0xBF => bbx(BbsFetchOffset(3)),
        0xCF => bbx(BbsFetchOffset(4)),
        0xDF => bbx(BbsFetchOffset(5)),
        0xEF => bbx(BbsFetchOffset(6)),
        0xFF => bbx(BbsFetchOffset(7)),

        // Every opcode not assigned an operation above is a reserved slot.
        // Real WDC/Rockwell silicon documents these as NOPs of varying
        // byte-length and cycle count; this crate simplifies all of them to
        // a uniform 1-byte/1-cycle NOP (see DESIGN.md) since none carry
        // operational meaning on either CMOS variant.
        _ => Pipeline::new(&[FetchOpcode]),
    })
}

fn build_table(variant: Variant) -> [Pipeline; 256] {
    let cmos = variant.is_cmos();
    let rockwell = matches!(variant, Variant::Rockwell65C02);
    let no_illegal = matches!(variant, Variant::Nmos6502NoIllegal);
    let mut table = [Pipeline::new(&[]); 256];
    let mut op: u16 = 0;
    while op < 256 {
        let opcode = op as u8;
        let entry = if cmos {
            documented_opcode(opcode, true)
                .or_else(|| cmos_extension_opcode(opcode, rockwell))
        } else if no_illegal {
            documented_opcode(opcode, false).or_else(|| nmos_no_illegal_opcode(opcode))
        } else {
            documented_opcode(opcode, false).or_else(|| nmos_illegal_opcode(opcode))
        };
        table[opcode as usize] =
            entry.unwrap_or_else(|| panic!("opcode {opcode:#04X} has no pipeline entry"));
        op += 1;
    }
    table
}

fn cell(variant: Variant) -> &'static OnceLock<[Pipeline; 256]> {
    static NMOS: OnceLock<[Pipeline; 256]> = OnceLock::new();
    static NMOS_NO_ILLEGAL: OnceLock<[Pipeline; 256]> = OnceLock::new();
    static WDC: OnceLock<[Pipeline; 256]> = OnceLock::new();
    static ROCKWELL: OnceLock<[Pipeline; 256]> = OnceLock::new();
    match variant {
        Variant::Nmos6502 => &NMOS,
        Variant::Nmos6502NoIllegal => &NMOS_NO_ILLEGAL,
        Variant::Wdc65C02 => &WDC,
        Variant::Rockwell65C02 => &ROCKWELL,
    }
}

/// The 256-entry pipeline table for `variant`, built once and shared for
/// the process's lifetime.
#[must_use]
pub fn table_for(variant: Variant) -> &'static [Pipeline; 256] {
    cell(variant).get_or_init(|| build_table(variant))
}

/// Look up the pipeline entry for `opcode` under `variant`.
#[must_use]
pub fn lookup(variant: Variant, opcode: u8) -> Pipeline {
    table_for(variant)[opcode as usize]
}
