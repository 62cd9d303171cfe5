//! Micro-operation primitives and their central dispatch.
//!
//! Each [`MicroOp`] variant is one bus cycle's worth of work: at most one
//! bus read or write, plus whatever register/flag arithmetic the real chip
//! performs for free in that same cycle (an ALU apply fused onto the cycle
//! that reads its operand, exactly as the teacher's `addr_zp`/`addr_abs`
//! methods fuse "read operand" and "call op(self, data)" into one state-
//! machine step). `spec.md` invariant: a table entry's micro-op count
//! equals the opcode's documented cycle count; any page-cross, decimal-mode
//! or interrupt-priority penalty is spliced into the *working* pipeline by
//! [`execute`] itself, never baked into the shared table.

use crate::bus::Bus;
use crate::flags::{C, D, N, V, Z};
use crate::state::CpuState;

/// Arithmetic/logical accumulator operations, fused with the memory read
/// (or immediate fetch) that supplies their operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Ora,
    And,
    Eor,
    AdcNmos,
    AdcCmos,
    SbcNmos,
    SbcCmos,
    Cmp,
    Cpx,
    Cpy,
    Bit,
    /// CMOS-only `BIT #imm`: sets Z only, leaves N/V untouched.
    BitImm,
    /// Illegal `ANC #imm`: `A &= imm`; `C` copied from the result's bit 7.
    Anc,
    /// Illegal `ALR #imm` (`ASR`): `A &= imm`, then `LSR A`.
    Alr,
    /// Illegal `ARR #imm`: `A &= imm`, then `ROR A`, with the BCD-aware
    /// C/V quirk real NMOS silicon exhibits.
    Arr,
    /// Illegal `AXS #imm` (`SBX`): `X = (A & X) - imm`, flags as `CMP`.
    Axs,
}

/// Read-modify-write operations (shift/rotate/inc/dec, the NMOS illegal
/// combined RMW opcodes, and the CMOS TRB/TSB bit-test-and-clear/set pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmwOp {
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
    Slo,
    Rla,
    Sre,
    Rra,
    Dcp,
    Isc,
    /// `TRB`: `M &= !A`; Z set from `A & M_before`.
    Trb,
    /// `TSB`: `M |= A`; Z set from `A & M_before`.
    Tsb,
}

/// Which register(s) a load (or illegal LAX/LXA/LAS) targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    A,
    X,
    Y,
    Ax,
    AxFromStack,
}

/// Which register/combination a store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSource {
    A,
    X,
    Y,
    Ax,
    ShaAxH,
    ShxXh,
    ShyYh,
    TasAxsH,
    Stz,
}

/// Single-cycle implied/accumulator operations that need a dummy opcode-
/// stream read but touch no memory operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpliedOp {
    Tax,
    Tay,
    Txa,
    Tya,
    Tsx,
    Txs,
    Inx,
    Iny,
    Dex,
    Dey,
    Nop,
    SetFlag(u8),
    ClearFlag(u8),
}

/// Accumulator-mode shift/rotate (ASL A/LSR A/ROL A/ROR A), plus the
/// CMOS-only INC A/DEC A.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorOp {
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
}

/// Index register used by an indexed addressing micro-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexReg {
    X,
    Y,
}

/// Whether an indexed addressing micro-op splices in a dummy-read penalty
/// cycle only when indexing crosses a page (reads), or never needs to
/// because the table already carries an unconditional one (stores/RMW,
/// which always pay the penalty regardless of crossing).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCrossPenalty {
    Conditional,
    AlreadyUnconditional,
}

/// Branch condition, including the CMOS-only unconditional `BRA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    CarryClear,
    CarrySet,
    ZeroClear,
    ZeroSet,
    NegativeClear,
    NegativeSet,
    OverflowClear,
    OverflowSet,
    Always,
}

impl Cond {
    fn holds(self, state: &CpuState) -> bool {
        let p = state.regs.p;
        match self {
            Self::CarryClear => !p.is_set(C),
            Self::CarrySet => p.is_set(C),
            Self::ZeroClear => !p.is_set(Z),
            Self::ZeroSet => p.is_set(Z),
            Self::NegativeClear => !p.is_set(N),
            Self::NegativeSet => p.is_set(N),
            Self::OverflowClear => !p.is_set(V),
            Self::OverflowSet => p.is_set(V),
            Self::Always => true,
        }
    }
}

/// A single micro-operation: one bus cycle (or, for the handful of
/// interrupt-sequencing ops, one cycle of internal bookkeeping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicroOp {
    // --- fetch / decode ---
    FetchOpcode,

    // --- addressing mode construction ---
    FetchAddrLow,
    FetchAddrHigh,
    FetchAddrHighIndexed(IndexReg, PageCrossPenalty),
    FetchZpAddr,
    FetchZpIndexed(IndexReg),
    FetchPointer,
    FetchPointerIndexedDummyRead,
    FetchIndirectLow,
    FetchIndirectHigh,
    FetchIndirectHighIndexedY(PageCrossPenalty),
    PageCrossDummyRead,
    PageCrossDummyReadUnconditional,
    /// CMOS equivalent of [`MicroOp::PageCrossDummyRead`]: re-reads
    /// `state.cmos_reread_addr` (the high-byte operand/pointer location)
    /// instead of the NMOS "wrong address" pattern.
    PageCrossDummyReadCmos,

    // --- terminal read+apply (ALU/compare/bit), one per addressing mode ---
    ReadApplyAlu(AluOp),
    ImmediateApplyAlu(AluOp),
    DecimalModeExtraCycle,

    // --- loads ---
    ReadLoad(LoadTarget),
    ImmediateLoad(LoadTarget),

    // --- stores ---
    WriteStore(StoreSource),

    // --- read-modify-write ---
    ReadForRmw,
    DummyWriteApplyRmw(RmwOp),
    DummyReadApplyRmw(RmwOp),
    WriteRmwFinal,
    AccumulatorApply(AccumulatorOp),

    // --- CMOS (zp) addressing: no index, used by ORA/AND/EOR/ADC/LDA/CMP/SBC/STA ---
    FetchZpPointerLow,
    FetchZpPointerHigh,

    // --- CMOS JMP (abs,X) ---
    JmpIdxFetchHigh,
    JmpIdxAddXDummy,
    JmpIdxReadLow,
    JmpIdxReadHighCommit,

    // --- CMOS bit manipulation ---
    /// Dummy-writes the unmodified byte back, then clears bit `n` in
    /// `temp_value` (matches the real RMB cycle pattern: read, dummy write
    /// of the old value, write of the new one).
    RmbApply(u8),
    /// As [`MicroOp::RmbApply`] but sets bit `n`.
    SmbApply(u8),
    BbrFetchOffset(u8),
    BbsFetchOffset(u8),
    /// Always present in a BBR/BBS table entry (fixed 5-cycle instruction,
    /// unlike ordinary branches); commits `temp_address` to PC, which the
    /// preceding fetch-offset op already set to either the branch target or
    /// the unchanged PC.
    BbrBbsBranch,

    // --- implied/register-only ---
    ImpliedDummyRead(ImpliedOp),

    // --- stack ---
    PushA,
    PushP,
    PushX,
    PushY,
    StackDummyRead,
    PullA,
    PullX,
    PullY,
    PullP,
    PullPcLow,
    PullPcHigh,
    RtsFixupPc,

    // --- subroutine ---
    JsrReadLow,
    JsrInternalDummy,
    JsrPushPch,
    JsrPushPcl,
    JsrReadHighJump,

    // --- jumps ---
    JmpAbsCommit,
    JmpIndReadLow,
    JmpIndCmosExtraCycle,
    JmpIndReadHighCommitNmos,
    JmpIndReadHighCommitCmos,

    // --- branches ---
    BranchFetchOffset(Cond),
    BranchTaken,
    BranchPageFix,

    // --- software/hardware interrupt sequencing ---
    /// BRK's ignored signature byte; PC still advances past it.
    BrkPadding,
    /// The dummy instruction-stream read IRQ/NMI/reset perform instead of
    /// a real opcode fetch before the push sequence begins.
    InterruptDummyRead,
    PushPch,
    PushPcl,
    /// BRK only: pushes P with B=1, u=1. Sets I=1 for free on this cycle
    /// (no separate cycle is spent on it, matching real silicon).
    PushStatusBrkSetI,
    /// CMOS BRK only: as [`MicroOp::PushStatusBrkSetI`], and also clears D.
    PushStatusBrkSetIClearD,
    /// NMI/IRQ only: pushes P with B=0, u=1. Sets I=1 for free.
    PushStatusHardwareSetI,
    /// CMOS NMI/IRQ only: as [`MicroOp::PushStatusHardwareSetI`], and also
    /// clears D.
    PushStatusHardwareSetIClearD,
    ReadVectorLow,
    ReadVectorHigh,
    /// Reset only: a dummy stack "push" that decrements S and performs a
    /// discarded read instead of a write, modelling the hardware's
    /// suppressed push.
    ResetDummyPush,
    /// Reset only: reads the vector high byte, loads PC, and sets I=1 for
    /// free on this cycle.
    ReadVectorHighSetI,

    // --- halts ---
    /// CMOS WAI: one dummy read, then `Waiting` (or `Bypassed`).
    Wai,
    /// CMOS STP: one dummy read, then `Stopped` (or `Bypassed`).
    Stp,
    /// NMOS JAM/KIL: one dummy read of this cycle; [`MicroOp::JamLatch`]
    /// ends the documented bus pattern and latches `Jammed`.
    Jam,
    /// One more cycle of the JAM bus pattern: a read of the given fixed
    /// address (`$FFFE`/`$FFFF` alternating), discarded.
    JamRead(u16),
    /// The last cycle of the JAM bus pattern: reads the given address and
    /// latches `Jammed` (or `Bypassed`).
    JamLatch(u16),
    NopFill,
}

fn page_crossed(lo_before: u8, index: u8) -> bool {
    u16::from(lo_before) + u16::from(index) > 0xFF
}

fn update_nz(state: &mut CpuState, value: u8) {
    state.regs.p.update_nz(value);
}

fn alu_read(state: &mut CpuState, op: AluOp, operand: u8) {
    match op {
        AluOp::Ora => {
            state.regs.a |= operand;
            update_nz(state, state.regs.a);
        }
        AluOp::And => {
            state.regs.a &= operand;
            update_nz(state, state.regs.a);
        }
        AluOp::Eor => {
            state.regs.a ^= operand;
            update_nz(state, state.regs.a);
        }
        AluOp::AdcNmos => adc_nmos(state, operand),
        AluOp::AdcCmos => adc_cmos(state, operand),
        AluOp::SbcNmos => sbc_nmos(state, operand),
        AluOp::SbcCmos => sbc_cmos(state, operand),
        AluOp::Cmp => compare(state, state.regs.a, operand),
        AluOp::Cpx => compare(state, state.regs.x, operand),
        AluOp::Cpy => compare(state, state.regs.y, operand),
        AluOp::Bit => {
            let a = state.regs.a;
            state.regs.p.set_if(Z, a & operand == 0);
            state.regs.p.set_if(N, operand & 0x80 != 0);
            state.regs.p.set_if(V, operand & 0x40 != 0);
        }
        AluOp::BitImm => {
            let a = state.regs.a;
            state.regs.p.set_if(Z, a & operand == 0);
        }
        AluOp::Anc => {
            state.regs.a &= operand;
            update_nz(state, state.regs.a);
            state.regs.p.set_if(C, state.regs.a & 0x80 != 0);
        }
        AluOp::Alr => {
            state.regs.a &= operand;
            let carry_out = state.regs.a & 0x01 != 0;
            state.regs.a >>= 1;
            state.regs.p.set_if(C, carry_out);
            update_nz(state, state.regs.a);
        }
        AluOp::Arr => {
            state.regs.a &= operand;
            let carry_in = u8::from(state.regs.p.is_set(C));
            state.regs.a = (state.regs.a >> 1) | (carry_in << 7);
            update_nz(state, state.regs.a);
            state.regs.p.set_if(C, state.regs.a & 0x40 != 0);
            state
                .regs
                .p
                .set_if(V, (state.regs.a & 0x40 != 0) ^ (state.regs.a & 0x20 != 0));
        }
        AluOp::Axs => {
            let combined = state.regs.a & state.regs.x;
            let result = combined.wrapping_sub(operand);
            state.regs.p.set_if(C, combined >= operand);
            state.regs.x = result;
            update_nz(state, result);
        }
    }
}

fn compare(state: &mut CpuState, reg: u8, operand: u8) {
    let result = reg.wrapping_sub(operand);
    let p = &mut state.regs.p;
    p.set_if(C, reg >= operand);
    p.update_nz(result);
}

/// NMOS binary ADC: flags always derive from the binary sum, even in
/// decimal mode (N/Z/V are "wrong" in BCD on real NMOS silicon).
fn adc_nmos(state: &mut CpuState, operand: u8) {
    let a = state.regs.a;
    let carry_in = u16::from(state.regs.p.is_set(C));
    let binary_sum = u16::from(a) + u16::from(operand) + carry_in;
    let binary_result = binary_sum as u8;
    let overflow = (!(a ^ operand) & (a ^ binary_result) & 0x80) != 0;

    if state.regs.p.is_set(D) {
        let mut lo = (a & 0x0F) + (operand & 0x0F) + carry_in as u8;
        let mut hi = (a >> 4) + (operand >> 4);
        if lo > 9 {
            lo = lo.wrapping_add(6);
            hi += 1;
        }
        let carry_out = hi > 9;
        if carry_out {
            hi = hi.wrapping_add(6);
        }
        let bcd_result = ((hi << 4) | (lo & 0x0F)) as u8;
        state.regs.a = bcd_result;
        let p = &mut state.regs.p;
        p.set_if(C, carry_out);
        p.set_if(N, binary_result & 0x80 != 0);
        p.set_if(Z, binary_result == 0);
        p.set_if(V, overflow);
    } else {
        state.regs.a = binary_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.update_nz(binary_result);
        p.set_if(V, overflow);
    }
}

/// CMOS ADC: N/Z/V are derived from the *decimal* result in BCD mode, and
/// decimal-mode ADC/SBC costs one extra cycle (handled by
/// [`MicroOp::DecimalModeExtraCycle`] spliced in by the caller).
fn adc_cmos(state: &mut CpuState, operand: u8) {
    let a = state.regs.a;
    let carry_in = u16::from(state.regs.p.is_set(C));

    if state.regs.p.is_set(D) {
        let mut lo = (a & 0x0F) + (operand & 0x0F) + carry_in as u8;
        let mut hi = (a >> 4) + (operand >> 4);
        if lo > 9 {
            lo = lo.wrapping_add(6);
            hi += 1;
        }
        let carry_out = hi > 9;
        if carry_out {
            hi = hi.wrapping_add(6);
        }
        let overflow_hi = hi;
        let bcd_result = ((overflow_hi << 4) | (lo & 0x0F)) as u8;
        let binary_sum = u16::from(a) + u16::from(operand) + carry_in;
        let overflow = (!(a ^ operand) & (a ^ (binary_sum as u8)) & 0x80) != 0;
        state.regs.a = bcd_result;
        let p = &mut state.regs.p;
        p.set_if(C, carry_out);
        p.update_nz(bcd_result);
        p.set_if(V, overflow);
    } else {
        let binary_sum = u16::from(a) + u16::from(operand) + carry_in;
        let binary_result = binary_sum as u8;
        let overflow = (!(a ^ operand) & (a ^ binary_result) & 0x80) != 0;
        state.regs.a = binary_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.update_nz(binary_result);
        p.set_if(V, overflow);
    }
}

fn sbc_nmos(state: &mut CpuState, operand: u8) {
    let a = state.regs.a;
    let carry_in = u16::from(state.regs.p.is_set(C));
    let inverted = !operand;
    let binary_sum = u16::from(a) + u16::from(inverted) + carry_in;
    let binary_result = binary_sum as u8;
    let overflow = ((a ^ operand) & (a ^ binary_result) & 0x80) != 0;

    if state.regs.p.is_set(D) {
        let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - i16::from(1 - carry_in as i16);
        let mut hi = (a >> 4) as i16 - (operand >> 4) as i16;
        if lo < 0 {
            lo += 10;
            hi -= 1;
        }
        if hi < 0 {
            hi += 10;
        }
        let bcd_result = (((hi as u8) << 4) | (lo as u8 & 0x0F)) as u8;
        state.regs.a = bcd_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.set_if(N, binary_result & 0x80 != 0);
        p.set_if(Z, binary_result == 0);
        p.set_if(V, overflow);
    } else {
        state.regs.a = binary_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.update_nz(binary_result);
        p.set_if(V, overflow);
    }
}

fn sbc_cmos(state: &mut CpuState, operand: u8) {
    let a = state.regs.a;
    let carry_in = u16::from(state.regs.p.is_set(C));
    let inverted = !operand;
    let binary_sum = u16::from(a) + u16::from(inverted) + carry_in;
    let binary_result = binary_sum as u8;
    let overflow = ((a ^ operand) & (a ^ binary_result) & 0x80) != 0;

    if state.regs.p.is_set(D) {
        let mut lo = (a & 0x0F) as i16 - (operand & 0x0F) as i16 - (1 - carry_in as i16);
        let mut hi = (a >> 4) as i16 - (operand >> 4) as i16;
        if lo < 0 {
            lo += 10;
            hi -= 1;
        }
        if hi < 0 {
            hi += 10;
        }
        let bcd_result = (((hi as u8) << 4) | (lo as u8 & 0x0F)) as u8;
        state.regs.a = bcd_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.update_nz(bcd_result);
        p.set_if(V, overflow);
    } else {
        state.regs.a = binary_result;
        let p = &mut state.regs.p;
        p.set_if(C, binary_sum > 0xFF);
        p.update_nz(binary_result);
        p.set_if(V, overflow);
    }
}

fn rmw_apply(state: &mut CpuState, op: RmwOp, value: u8) -> u8 {
    match op {
        RmwOp::Asl => {
            let result = value << 1;
            state.regs.p.set_if(C, value & 0x80 != 0);
            update_nz(state, result);
            result
        }
        RmwOp::Lsr => {
            let result = value >> 1;
            state.regs.p.set_if(C, value & 0x01 != 0);
            update_nz(state, result);
            result
        }
        RmwOp::Rol => {
            let carry_in = u8::from(state.regs.p.is_set(C));
            let result = (value << 1) | carry_in;
            state.regs.p.set_if(C, value & 0x80 != 0);
            update_nz(state, result);
            result
        }
        RmwOp::Ror => {
            let carry_in = u8::from(state.regs.p.is_set(C));
            let result = (value >> 1) | (carry_in << 7);
            state.regs.p.set_if(C, value & 0x01 != 0);
            update_nz(state, result);
            result
        }
        RmwOp::Inc => {
            let result = value.wrapping_add(1);
            update_nz(state, result);
            result
        }
        RmwOp::Dec => {
            let result = value.wrapping_sub(1);
            update_nz(state, result);
            result
        }
        RmwOp::Slo => {
            let shifted = value << 1;
            state.regs.p.set_if(C, value & 0x80 != 0);
            state.regs.a |= shifted;
            update_nz(state, state.regs.a);
            shifted
        }
        RmwOp::Rla => {
            let carry_in = u8::from(state.regs.p.is_set(C));
            let rotated = (value << 1) | carry_in;
            state.regs.p.set_if(C, value & 0x80 != 0);
            state.regs.a &= rotated;
            update_nz(state, state.regs.a);
            rotated
        }
        RmwOp::Sre => {
            let shifted = value >> 1;
            state.regs.p.set_if(C, value & 0x01 != 0);
            state.regs.a ^= shifted;
            update_nz(state, state.regs.a);
            shifted
        }
        RmwOp::Rra => {
            let carry_in = u8::from(state.regs.p.is_set(C));
            let rotated = (value >> 1) | (carry_in << 7);
            state.regs.p.set_if(C, value & 0x01 != 0);
            adc_nmos(state, rotated);
            rotated
        }
        RmwOp::Dcp => {
            let decremented = value.wrapping_sub(1);
            compare(state, state.regs.a, decremented);
            decremented
        }
        RmwOp::Isc => {
            let incremented = value.wrapping_add(1);
            sbc_nmos(state, incremented);
            incremented
        }
        RmwOp::Trb => {
            let a = state.regs.a;
            state.regs.p.set_if(Z, a & value == 0);
            value & !a
        }
        RmwOp::Tsb => {
            let a = state.regs.a;
            state.regs.p.set_if(Z, a & value == 0);
            value | a
        }
    }
}

fn implied_apply(state: &mut CpuState, op: ImpliedOp) {
    match op {
        ImpliedOp::Tax => {
            state.regs.x = state.regs.a;
            update_nz(state, state.regs.x);
        }
        ImpliedOp::Tay => {
            state.regs.y = state.regs.a;
            update_nz(state, state.regs.y);
        }
        ImpliedOp::Txa => {
            state.regs.a = state.regs.x;
            update_nz(state, state.regs.a);
        }
        ImpliedOp::Tya => {
            state.regs.a = state.regs.y;
            update_nz(state, state.regs.a);
        }
        ImpliedOp::Tsx => {
            state.regs.x = state.regs.s;
            update_nz(state, state.regs.x);
        }
        ImpliedOp::Txs => {
            state.regs.s = state.regs.x;
        }
        ImpliedOp::Inx => {
            state.regs.x = state.regs.x.wrapping_add(1);
            update_nz(state, state.regs.x);
        }
        ImpliedOp::Iny => {
            state.regs.y = state.regs.y.wrapping_add(1);
            update_nz(state, state.regs.y);
        }
        ImpliedOp::Dex => {
            state.regs.x = state.regs.x.wrapping_sub(1);
            update_nz(state, state.regs.x);
        }
        ImpliedOp::Dey => {
            state.regs.y = state.regs.y.wrapping_sub(1);
            update_nz(state, state.regs.y);
        }
        ImpliedOp::Nop => {}
        ImpliedOp::SetFlag(flag) => state.regs.p.set(flag),
        ImpliedOp::ClearFlag(flag) => state.regs.p.clear(flag),
    }
}

fn load_apply(state: &mut CpuState, target: LoadTarget, value: u8) {
    match target {
        LoadTarget::A => {
            state.regs.a = value;
            update_nz(state, value);
        }
        LoadTarget::X => {
            state.regs.x = value;
            update_nz(state, value);
        }
        LoadTarget::Y => {
            state.regs.y = value;
            update_nz(state, value);
        }
        LoadTarget::Ax => {
            state.regs.a = value;
            state.regs.x = value;
            update_nz(state, value);
        }
        LoadTarget::AxFromStack => {
            let result = value & state.regs.s;
            state.regs.a = result;
            state.regs.x = result;
            state.regs.s = result;
            update_nz(state, result);
        }
    }
}

fn store_value(state: &CpuState, source: StoreSource) -> u8 {
    match source {
        StoreSource::A => state.regs.a,
        StoreSource::X => state.regs.x,
        StoreSource::Y => state.regs.y,
        StoreSource::Ax => state.regs.a & state.regs.x,
        StoreSource::ShaAxH => (state.regs.a & state.regs.x) & state.base_hi.wrapping_add(1),
        StoreSource::ShxXh => state.regs.x & state.base_hi.wrapping_add(1),
        StoreSource::ShyYh => state.regs.y & state.base_hi.wrapping_add(1),
        StoreSource::TasAxsH => {
            let result = state.regs.a & state.regs.x;
            result & state.base_hi.wrapping_add(1)
        }
        StoreSource::Stz => 0,
    }
}

/// Execute one micro-op: at most one bus access, plus whatever register and
/// flag bookkeeping the real opcode performs on that cycle. `cmos` selects
/// between NMOS and CMOS page-cross penalty behavior for the handful of ops
/// that diverge between the two families.
pub fn execute<B: Bus>(state: &mut CpuState, bus: &mut B, op: MicroOp, cmos: bool) {
    match op {
        MicroOp::FetchOpcode => {
            state.opcode = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
        }

        MicroOp::FetchAddrLow => {
            state.temp_address_lo = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
        }
        MicroOp::FetchAddrHigh => {
            let hi = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            state.temp_address = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::FetchAddrHighIndexed(index, penalty) => {
            let hi = bus.read(state.regs.pc);
            let hi_addr = state.regs.pc;
            state.regs.pc = state.regs.pc.wrapping_add(1);
            let idx = match index {
                IndexReg::X => state.regs.x,
                IndexReg::Y => state.regs.y,
            };
            state.page_crossed = page_crossed(state.temp_address_lo, idx);
            state.base_hi = hi;
            let base = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
            state.temp_address = base.wrapping_add(u16::from(idx));
            if penalty == PageCrossPenalty::Conditional && state.page_crossed {
                if cmos {
                    state.cmos_reread_addr = hi_addr;
                    state.pipeline.insert_next(MicroOp::PageCrossDummyReadCmos);
                } else {
                    state.pipeline.insert_next(MicroOp::PageCrossDummyRead);
                }
            }
        }
        MicroOp::FetchZpAddr => {
            state.temp_address_lo = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            state.temp_address = u16::from(state.temp_address_lo);
        }
        MicroOp::FetchZpIndexed(index) => {
            let _ = bus.read(state.temp_address);
            let idx = match index {
                IndexReg::X => state.regs.x,
                IndexReg::Y => state.regs.y,
            };
            state.temp_address_lo = state.temp_address_lo.wrapping_add(idx);
            state.temp_address = u16::from(state.temp_address_lo);
        }
        MicroOp::FetchPointer => {
            state.pointer = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
        }
        MicroOp::FetchPointerIndexedDummyRead => {
            let _ = bus.read(u16::from(state.pointer));
            state.pointer = state.pointer.wrapping_add(state.regs.x);
        }
        MicroOp::FetchIndirectLow => {
            state.temp_address_lo = bus.read(u16::from(state.pointer));
        }
        MicroOp::FetchIndirectHigh => {
            let hi = bus.read(u16::from(state.pointer.wrapping_add(1)));
            state.temp_address = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::FetchIndirectHighIndexedY(penalty) => {
            let hi_addr = u16::from(state.pointer.wrapping_add(1));
            let hi = bus.read(hi_addr);
            state.page_crossed = page_crossed(state.temp_address_lo, state.regs.y);
            state.base_hi = hi;
            let base = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
            state.temp_address = base.wrapping_add(u16::from(state.regs.y));
            if penalty == PageCrossPenalty::Conditional && state.page_crossed {
                if cmos {
                    state.cmos_reread_addr = hi_addr;
                    state.pipeline.insert_next(MicroOp::PageCrossDummyReadCmos);
                } else {
                    state.pipeline.insert_next(MicroOp::PageCrossDummyRead);
                }
            }
        }
        MicroOp::PageCrossDummyRead => {
            let wrong_hi = (state.temp_address & 0xFF00).wrapping_sub(0x0100);
            let wrong_addr = wrong_hi | (state.temp_address & 0x00FF);
            let _ = bus.read(wrong_addr);
        }
        MicroOp::PageCrossDummyReadUnconditional => {
            let wrong_hi = (state.temp_address & 0xFF00).wrapping_sub(0x0100);
            let wrong_addr = wrong_hi | (state.temp_address & 0x00FF);
            let _ = bus.read(wrong_addr);
        }
        MicroOp::PageCrossDummyReadCmos => {
            let _ = bus.read(state.cmos_reread_addr);
        }

        MicroOp::ReadApplyAlu(alu) => {
            let value = bus.read(state.temp_address);
            let needs_decimal_penalty =
                matches!(alu, AluOp::AdcCmos | AluOp::SbcCmos) && state.regs.p.is_set(D);
            alu_read(state, alu, value);
            if needs_decimal_penalty {
                state.pipeline.insert_next(MicroOp::DecimalModeExtraCycle);
            }
        }
        MicroOp::ImmediateApplyAlu(alu) => {
            let value = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            let needs_decimal_penalty =
                matches!(alu, AluOp::AdcCmos | AluOp::SbcCmos) && state.regs.p.is_set(D);
            alu_read(state, alu, value);
            if needs_decimal_penalty {
                state.pipeline.insert_next(MicroOp::DecimalModeExtraCycle);
            }
        }
        MicroOp::DecimalModeExtraCycle => {
            let _ = bus.read(state.regs.pc.wrapping_sub(1));
        }

        MicroOp::ReadLoad(target) => {
            let value = bus.read(state.temp_address);
            load_apply(state, target, value);
        }
        MicroOp::ImmediateLoad(target) => {
            let value = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            load_apply(state, target, value);
        }

        MicroOp::WriteStore(source) => {
            let value = store_value(state, source);
            bus.write(state.temp_address, value);
        }

        MicroOp::ReadForRmw => {
            state.temp_value = bus.read(state.temp_address);
        }
        MicroOp::DummyWriteApplyRmw(rmw) => {
            bus.write(state.temp_address, state.temp_value);
            state.temp_value = rmw_apply(state, rmw, state.temp_value);
        }
        MicroOp::DummyReadApplyRmw(rmw) => {
            let _ = bus.read(state.temp_address);
            state.temp_value = rmw_apply(state, rmw, state.temp_value);
        }
        MicroOp::WriteRmwFinal => {
            bus.write(state.temp_address, state.temp_value);
        }
        MicroOp::AccumulatorApply(acc) => {
            let value = state.regs.a;
            let rmw = match acc {
                AccumulatorOp::Asl => RmwOp::Asl,
                AccumulatorOp::Lsr => RmwOp::Lsr,
                AccumulatorOp::Rol => RmwOp::Rol,
                AccumulatorOp::Ror => RmwOp::Ror,
                AccumulatorOp::Inc => RmwOp::Inc,
                AccumulatorOp::Dec => RmwOp::Dec,
            };
            let _ = bus.read(state.regs.pc);
            state.regs.a = rmw_apply(state, rmw, value);
        }

        MicroOp::RmbApply(bit) => {
            bus.write(state.temp_address, state.temp_value);
            state.temp_value &= !(1 << bit);
        }
        MicroOp::SmbApply(bit) => {
            bus.write(state.temp_address, state.temp_value);
            state.temp_value |= 1 << bit;
        }
        MicroOp::BbrFetchOffset(bit) => {
            let tested = state.temp_value & (1 << bit) == 0;
            bbr_bbs_fetch(state, bus, tested);
        }
        MicroOp::BbsFetchOffset(bit) => {
            let tested = state.temp_value & (1 << bit) != 0;
            bbr_bbs_fetch(state, bus, tested);
        }
        MicroOp::BbrBbsBranch => {
            // BBR/BBS take a fixed 5 cycles whether or not the branch is
            // taken or crosses a page boundary: this op always runs, and
            // `temp_address` was already set (by the preceding fetch-offset
            // op) to either the branch target or the unchanged PC.
            let _ = bus.read(state.regs.pc.wrapping_sub(1));
            state.regs.pc = state.temp_address;
        }

        MicroOp::FetchZpPointerLow => {
            state.temp_address_lo = bus.read(u16::from(state.pointer));
        }
        MicroOp::FetchZpPointerHigh => {
            let hi = bus.read(u16::from(state.pointer.wrapping_add(1)));
            state.temp_address = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }

        MicroOp::JmpIdxFetchHigh => {
            let hi = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            state.temp_address = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::JmpIdxAddXDummy => {
            let _ = bus.read(state.regs.pc.wrapping_sub(1));
            state.temp_address = state.temp_address.wrapping_add(u16::from(state.regs.x));
        }
        MicroOp::JmpIdxReadLow => {
            state.temp_value = bus.read(state.temp_address);
        }
        MicroOp::JmpIdxReadHighCommit => {
            let hi = bus.read(state.temp_address.wrapping_add(1));
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_value);
        }

        MicroOp::ImpliedDummyRead(implied) => {
            let _ = bus.read(state.regs.pc);
            implied_apply(state, implied);
        }

        MicroOp::PushA => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.a);
        }
        MicroOp::PushP => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.p.to_byte_brk());
        }
        MicroOp::PushX => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.x);
        }
        MicroOp::PushY => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.y);
        }
        MicroOp::StackDummyRead => {
            let _ = bus.read(state.regs.stack_addr());
        }
        MicroOp::PullA => {
            let addr = state.regs.pop();
            state.regs.a = bus.read(addr);
            update_nz(state, state.regs.a);
        }
        MicroOp::PullX => {
            let addr = state.regs.pop();
            state.regs.x = bus.read(addr);
            update_nz(state, state.regs.x);
        }
        MicroOp::PullY => {
            let addr = state.regs.pop();
            state.regs.y = bus.read(addr);
            update_nz(state, state.regs.y);
        }
        MicroOp::PullP => {
            let addr = state.regs.pop();
            let byte = bus.read(addr);
            state.regs.p = crate::flags::Flags::from_byte(byte);
        }
        MicroOp::PullPcLow => {
            let addr = state.regs.pop();
            state.temp_address_lo = bus.read(addr);
        }
        MicroOp::PullPcHigh => {
            let addr = state.regs.pop();
            let hi = bus.read(addr);
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::RtsFixupPc => {
            let _ = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
        }

        MicroOp::JsrReadLow => {
            state.temp_address_lo = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
        }
        MicroOp::JsrInternalDummy => {
            let _ = bus.read(state.regs.stack_addr());
        }
        MicroOp::JsrPushPch => {
            let addr = state.regs.push();
            bus.write(addr, (state.regs.pc >> 8) as u8);
        }
        MicroOp::JsrPushPcl => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.pc as u8);
        }
        MicroOp::JsrReadHighJump => {
            let hi = bus.read(state.regs.pc);
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }

        MicroOp::JmpAbsCommit => {
            let hi = bus.read(state.regs.pc);
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::JmpIndReadLow => {
            state.temp_value = bus.read(state.temp_address);
        }
        MicroOp::JmpIndCmosExtraCycle => {
            // The 65C02 fix re-reads the pointer's low byte for one extra
            // cycle before reading the (correctly incremented) high byte.
            let _ = bus.read(state.temp_address);
        }
        MicroOp::JmpIndReadHighCommitNmos => {
            // Page-wrap bug: the high byte comes from the same page as the
            // pointer, not from the next page, when the pointer's low byte
            // is $FF.
            let hi_addr =
                (state.temp_address & 0xFF00) | (state.temp_address.wrapping_add(1) & 0x00FF);
            let hi = bus.read(hi_addr);
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_value);
        }
        MicroOp::JmpIndReadHighCommitCmos => {
            let hi_addr = state.temp_address.wrapping_add(1);
            let hi = bus.read(hi_addr);
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_value);
        }

        MicroOp::BranchFetchOffset(cond) => {
            let offset = bus.read(state.regs.pc) as i8;
            state.regs.pc = state.regs.pc.wrapping_add(1);
            if cond.holds(state) {
                let base = state.regs.pc;
                let target = base.wrapping_add(offset as i16 as u16);
                state.page_crossed = (base & 0xFF00) != (target & 0xFF00);
                state.temp_address = target;
                state.pipeline.push_back(MicroOp::BranchTaken);
            }
        }
        MicroOp::BranchTaken => branch_commit(state, bus),
        MicroOp::BranchPageFix => {
            let _ = bus.read(state.temp_address);
            state.regs.pc = state.temp_address;
        }

        MicroOp::BrkPadding => {
            let _ = bus.read(state.regs.pc);
            state.regs.pc = state.regs.pc.wrapping_add(1);
            state.interrupt_vector = 0xFFFE;
            state.software_interrupt = true;
        }
        MicroOp::InterruptDummyRead => {
            let _ = bus.read(state.regs.pc);
        }
        MicroOp::PushPch => {
            let addr = state.regs.push();
            bus.write(addr, (state.regs.pc >> 8) as u8);
        }
        MicroOp::PushPcl => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.pc as u8);
        }
        MicroOp::PushStatusBrkSetI => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.p.to_byte_brk());
            state.regs.p.set(crate::flags::I);
        }
        MicroOp::PushStatusBrkSetIClearD => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.p.to_byte_brk());
            state.regs.p.set(crate::flags::I);
            state.regs.p.clear(crate::flags::D);
        }
        MicroOp::PushStatusHardwareSetI => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.p.to_byte_irq());
            state.regs.p.set(crate::flags::I);
        }
        MicroOp::PushStatusHardwareSetIClearD => {
            let addr = state.regs.push();
            bus.write(addr, state.regs.p.to_byte_irq());
            state.regs.p.set(crate::flags::I);
            state.regs.p.clear(crate::flags::D);
        }
        MicroOp::ReadVectorLow => {
            state.temp_address_lo = bus.read(state.interrupt_vector);
        }
        MicroOp::ReadVectorHigh => {
            let hi = bus.read(state.interrupt_vector.wrapping_add(1));
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
        }
        MicroOp::ResetDummyPush => {
            let addr = state.regs.push();
            let _ = bus.read(addr);
        }
        MicroOp::ReadVectorHighSetI => {
            let hi = bus.read(state.interrupt_vector.wrapping_add(1));
            state.regs.pc = u16::from(hi) << 8 | u16::from(state.temp_address_lo);
            state.regs.p.set(crate::flags::I);
        }

        MicroOp::Wai => {
            let _ = bus.read(state.regs.pc);
            state.status = if state.ignore_halt_stop_wait {
                crate::status::CpuStatus::Bypassed
            } else {
                crate::status::CpuStatus::Waiting
            };
        }
        MicroOp::Stp => {
            let _ = bus.read(state.regs.pc);
            state.status = if state.ignore_halt_stop_wait {
                crate::status::CpuStatus::Bypassed
            } else {
                crate::status::CpuStatus::Stopped
            };
        }
        MicroOp::Jam => {
            let _ = bus.read(state.regs.pc);
        }
        MicroOp::JamRead(addr) => {
            let _ = bus.read(addr);
        }
        MicroOp::JamLatch(addr) => {
            let _ = bus.read(addr);
            state.status = if state.ignore_halt_stop_wait {
                crate::status::CpuStatus::Bypassed
            } else {
                crate::status::CpuStatus::Jammed
            };
        }
        MicroOp::NopFill => {
            let _ = bus.read(state.regs.pc);
        }
    }
}

/// Reads the branch-offset operand byte and resolves the address
/// [`MicroOp::BbrBbsBranch`] (always the next and final op in a BBR/BBS
/// table entry) will commit to PC: the branch target if `taken`, or the
/// unchanged PC otherwise. Never splices extra cycles — BBR/BBS cost a
/// fixed 5 cycles regardless of outcome.
fn bbr_bbs_fetch<B: Bus>(state: &mut CpuState, bus: &mut B, taken: bool) {
    let offset = bus.read(state.regs.pc) as i8;
    state.regs.pc = state.regs.pc.wrapping_add(1);
    state.temp_address = if taken {
        state.regs.pc.wrapping_add(offset as i16 as u16)
    } else {
        state.regs.pc
    };
}

fn branch_commit<B: Bus>(state: &mut CpuState, bus: &mut B) {
    let wrong_addr =
        (state.regs.pc & 0xFF00) | (state.temp_address & 0x00FF);
    let _ = bus.read(wrong_addr);
    if state.page_crossed {
        state.pipeline.push_back(MicroOp::BranchPageFix);
    } else {
        state.regs.pc = state.temp_address;
    }
}

