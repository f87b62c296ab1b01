//! Version gate
//!
//! The catalogue of operations that only exist natively in newer runtime
//! releases, together with the exact release in which each one appeared.
//! `build.rs` evaluates this table once against the target version and emits
//! one `cfg` flag per operation the runtime already provides; `compat` picks
//! the native symbol or its own polyfill from that flag. Nothing here runs at
//! extension run time except the reporting helpers.
//!
//! This file is also compiled into `build.rs`.

use crate::version::RuntimeVersion;

/// How an operation reaches calling code for a given target version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provision {
    /// The runtime exports the symbol; the shim re-exports it untouched
    Native,
    /// The shim defines an equivalent implementation
    Polyfill,
    /// Neither: the runtime predates the data the operation reads
    Unavailable,
}

impl Provision {
    pub const fn as_str(self) -> &'static str {
        match self {
            Provision::Native => "native",
            Provision::Polyfill => "polyfill",
            Provision::Unavailable => "unavailable",
        }
    }
}

/// A gated operation of the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    NewRef,
    XNewRef,
    SetRefcnt,
    SetType,
    SetSize,
    IsType,
    FrameGetCode,
    FrameGetBack,
    ThreadStateGetFrame,
    ThreadStateGetInterpreter,
    InterpreterGet,
    ThreadStateGetId,
    CallNoArgs,
    CallOneArg,
    ModuleAddType,
    GcIsTracked,
    GcIsFinalized,
}

/// cfg flag set when the thread state carries a unique id field
pub const THREAD_STATE_ID_CFG: &str = "rt_thread_state_id";

/// First release whose thread state carries a unique id
pub const THREAD_STATE_ID_SINCE: RuntimeVersion = RuntimeVersion::alpha(3, 7, 1);

impl Operation {
    /// Every gated operation, in catalogue order
    pub const ALL: [Operation; 17] = [
        Operation::NewRef,
        Operation::XNewRef,
        Operation::SetRefcnt,
        Operation::SetType,
        Operation::SetSize,
        Operation::IsType,
        Operation::FrameGetCode,
        Operation::FrameGetBack,
        Operation::ThreadStateGetFrame,
        Operation::ThreadStateGetInterpreter,
        Operation::InterpreterGet,
        Operation::ThreadStateGetId,
        Operation::CallNoArgs,
        Operation::CallOneArg,
        Operation::ModuleAddType,
        Operation::GcIsTracked,
        Operation::GcIsFinalized,
    ];

    /// Stable name of the operation in `compat`
    pub const fn name(self) -> &'static str {
        match self {
            Operation::NewRef => "new_ref",
            Operation::XNewRef => "xnew_ref",
            Operation::SetRefcnt => "set_refcnt",
            Operation::SetType => "set_type",
            Operation::SetSize => "set_size",
            Operation::IsType => "is_type",
            Operation::FrameGetCode => "frame_get_code",
            Operation::FrameGetBack => "frame_get_back",
            Operation::ThreadStateGetFrame => "thread_state_get_frame",
            Operation::ThreadStateGetInterpreter => "thread_state_get_interpreter",
            Operation::InterpreterGet => "interpreter_get",
            Operation::ThreadStateGetId => "thread_state_get_id",
            Operation::CallNoArgs => "call_no_args",
            Operation::CallOneArg => "call_one_arg",
            Operation::ModuleAddType => "module_add_type",
            Operation::GcIsTracked => "gc_is_tracked",
            Operation::GcIsFinalized => "gc_is_finalized",
        }
    }

    /// First runtime release that exports the operation natively
    ///
    /// The three field setters appeared together in 3.9.0a4, but they are
    /// gated separately: the runtime stopped accepting the fields as
    /// assignable locations in different releases afterwards.
    pub const fn native_since(self) -> RuntimeVersion {
        match self {
            Operation::NewRef | Operation::XNewRef => RuntimeVersion::alpha(3, 10, 3),
            Operation::SetRefcnt
            | Operation::SetType
            | Operation::SetSize
            | Operation::IsType
            | Operation::CallOneArg => RuntimeVersion::alpha(3, 9, 4),
            Operation::FrameGetCode | Operation::FrameGetBack | Operation::ThreadStateGetFrame => {
                RuntimeVersion::beta(3, 9, 1)
            }
            Operation::ThreadStateGetInterpreter
            | Operation::InterpreterGet
            | Operation::ModuleAddType => RuntimeVersion::alpha(3, 9, 5),
            Operation::ThreadStateGetId | Operation::GcIsTracked | Operation::GcIsFinalized => {
                RuntimeVersion::alpha(3, 9, 6)
            }
            Operation::CallNoArgs => RuntimeVersion::alpha(3, 9, 1),
        }
    }

    /// Oldest release on which the operation can be provided at all
    pub const fn available_since(self) -> Option<RuntimeVersion> {
        match self {
            Operation::ThreadStateGetId => Some(THREAD_STATE_ID_SINCE),
            _ => None,
        }
    }

    /// The `cfg` flag `build.rs` sets when the operation is native
    pub const fn cfg_name(self) -> &'static str {
        match self {
            // new_ref and xnew_ref were added together and share a flag
            Operation::NewRef | Operation::XNewRef => "rt_native_new_ref",
            Operation::SetRefcnt => "rt_native_set_refcnt",
            Operation::SetType => "rt_native_set_type",
            Operation::SetSize => "rt_native_set_size",
            Operation::IsType => "rt_native_is_type",
            Operation::FrameGetCode => "rt_native_frame_get_code",
            Operation::FrameGetBack => "rt_native_frame_get_back",
            Operation::ThreadStateGetFrame => "rt_native_thread_state_get_frame",
            Operation::ThreadStateGetInterpreter => "rt_native_thread_state_get_interpreter",
            Operation::InterpreterGet => "rt_native_interpreter_get",
            Operation::ThreadStateGetId => "rt_native_thread_state_get_id",
            Operation::CallNoArgs => "rt_native_call_no_args",
            Operation::CallOneArg => "rt_native_call_one_arg",
            Operation::ModuleAddType => "rt_native_module_add_type",
            Operation::GcIsTracked => "rt_native_gc_is_tracked",
            Operation::GcIsFinalized => "rt_native_gc_is_finalized",
        }
    }

    /// Decide how the operation is provided for `target`
    pub fn provision(self, target: RuntimeVersion) -> Provision {
        if target >= self.native_since() {
            return Provision::Native;
        }
        match self.available_since() {
            Some(floor) if target < floor => Provision::Unavailable,
            _ => Provision::Polyfill,
        }
    }
}

/// One row of the catalogue report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub operation: Operation,
    pub native_since: RuntimeVersion,
    pub provision: Provision,
}

/// The full catalogue as seen from `target`
pub fn catalogue(target: RuntimeVersion) -> Vec<Entry> {
    Operation::ALL
        .iter()
        .map(|&operation| Entry {
            operation,
            native_since: operation.native_since(),
            provision: operation.provision(target),
        })
        .collect()
}

/// Every cfg flag the gate may emit
pub fn all_cfg_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Operation::ALL.iter().map(|op| op.cfg_name()).collect();
    names.push(THREAD_STATE_ID_CFG);
    names.sort_unstable();
    names.dedup();
    names
}

/// The cfg flags that are set for `target`
pub fn enabled_cfg_names(target: RuntimeVersion) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Operation::ALL
        .iter()
        .filter(|op| op.provision(target) == Provision::Native)
        .map(|op| op.cfg_name())
        .collect();
    if target >= THREAD_STATE_ID_SINCE {
        names.push(THREAD_STATE_ID_CFG);
    }
    names.sort_unstable();
    names.dedup();
    names
}
