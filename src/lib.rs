//! Sopsistry - team access and key rotation for sops-encrypted files.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface (sistry)
//! │   ├── init          # Initialize the manifest and local key
//! │   ├── apply         # plan / apply
//! │   ├── member        # add-member / remove-member / list
//! │   ├── files         # encrypt / decrypt / sops-cmd
//! │   ├── rotate        # rotate-key
//! │   ├── check         # Tool, key age and sops config checks
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── manifest      # sopsistry.yaml load/save/validate
//!     ├── planner       # Manifest + filesystem -> Plan
//!     ├── executor      # Plan -> files, with backup and rollback
//!     ├── rotation      # Transactional key rotation
//!     ├── sops/         # sops invocation builder and Crypter trait
//!     ├── keys/         # Keygen trait, age-keygen, key files
//!     ├── domain/       # Member, Scope, Plan, key expiry
//!     └── workspace/    # Facade tying it together
//! ```
//!
//! Cryptography stays in external tools: files are encrypted and re-keyed
//! by `sops`, key pairs are generated by `age-keygen`.

pub mod cli;
pub mod core;
pub mod error;
