//! Hooks into a thread's user address space.

/// The user-program side of a thread, supplied by the program loader.
///
/// The dispatcher calls the save pair on the outgoing thread before the
/// context transfer and the restore pair on the incoming thread after it.
/// Implementations own whatever the address space needs (page tables,
/// the user register file); dropping the value releases it.
pub trait AddressSpace {
    /// Copy the user-mode CPU registers into the thread's own storage.
    fn save_user_state(&mut self);

    /// Persist switch-relevant address-space state (e.g. page table pointers).
    fn save_switch_state(&mut self);

    /// Load the thread's saved user-mode registers back into the CPU.
    fn restore_user_state(&mut self);

    /// Re-install the address space on the CPU (e.g. the page table register).
    fn restore_switch_state(&mut self);
}
