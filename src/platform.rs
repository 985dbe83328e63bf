//! Host platform detection and the item-group platform gate
//!
//! Traversal projects commonly fence Unix-only members behind
//! `Condition="'$(OS)' != 'Windows_NT'"`. Recognizing that one shape is all the
//! member resolver needs, so this is a substring rule rather than an
//! expression evaluator. Other condition spellings are treated as always
//! applying.

use std::fmt;

/// Operating system family as MSBuild's `$(OS)` property reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPlatform {
  Windows,
  Unix,
}

impl HostPlatform {
  pub fn current() -> Self {
    if cfg!(target_os = "windows") {
      HostPlatform::Windows
    } else {
      HostPlatform::Unix
    }
  }

  /// Value of the `$(OS)` property on this platform
  pub fn os_property(self) -> &'static str {
    match self {
      HostPlatform::Windows => "Windows_NT",
      HostPlatform::Unix => "Unix",
    }
  }

  /// Whether an item group with this raw condition applies on this host.
  ///
  /// Only the "not on Windows" gate is understood; everything else applies.
  pub fn applies(self, condition: Option<&str>) -> bool {
    match condition {
      Some(condition) if excludes_windows(condition) => self != HostPlatform::Windows,
      _ => true,
    }
  }
}

impl fmt::Display for HostPlatform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.os_property())
  }
}

/// `'$(OS)' != 'Windows_NT'`, tolerant of whitespace and quoting style.
fn excludes_windows(condition: &str) -> bool {
  let compact: String = condition
    .chars()
    .filter(|c| !c.is_whitespace())
    .map(|c| if c == '"' { '\'' } else { c })
    .collect();
  let compact = compact.to_ascii_lowercase();

  compact.contains("'$(os)'") && compact.contains("!='windows_nt'")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_not_windows_gate() {
    let condition = Some("'$(OS)' != 'Windows_NT'");
    assert!(!HostPlatform::Windows.applies(condition));
    assert!(HostPlatform::Unix.applies(condition));
  }

  #[test]
  fn test_gate_tolerates_spacing_and_quotes() {
    let condition = Some("  \"$(OS)\"!=\"Windows_NT\" ");
    assert!(!HostPlatform::Windows.applies(condition));
  }

  #[test]
  fn test_other_conditions_always_apply() {
    for condition in [
      None,
      Some("'$(OS)' == 'Windows_NT'"),
      Some("'$(Configuration)' != 'Release'"),
      Some("Exists('foo')"),
    ] {
      assert!(HostPlatform::Windows.applies(condition), "{:?}", condition);
      assert!(HostPlatform::Unix.applies(condition), "{:?}", condition);
    }
  }

  #[test]
  fn test_os_property() {
    assert_eq!(HostPlatform::Windows.os_property(), "Windows_NT");
    assert_eq!(HostPlatform::Unix.to_string(), "Unix");
    #[cfg(not(target_os = "windows"))]
    assert_eq!(HostPlatform::current(), HostPlatform::Unix);
  }
}
