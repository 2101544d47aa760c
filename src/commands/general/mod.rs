pub mod help;

use super::*;
