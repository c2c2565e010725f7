//! Integration tests for the about, home, and pricing page presets.
//!
//! Uses a mock site with the three pages in their pre-cleanup form.

use std::fs;
use tempfile::TempDir;
use text_patcher::config::{check_patch_set, CheckStatus};
use text_patcher::presets::{find_preset, PRESETS};
use text_patcher::runner::{PatchStatus, RunMode};

const ABOUT_PAGE: &str = r#"export default function AboutPage() {
  const values = [
    { icon: '🎖️', title: 'Veteran Leadership', description: 'Military discipline meets AI innovation' },
    { icon: '🤖', title: 'AI Councils', description: 'Many minds, one debate' },
  ];

  return (
    <main>
      <p>Janus Forge Nexus is a veteran-owned platform where multiple AI personalities debate in real time.</p>
      <span className="badge">🎖️ Veteran Owned & Operated</span>
      <footer>
        <div className="text-gray-400 mt-2">Veteran Owned</div>
      </footer>
    </main>
  );
}
"#;

const ABOUT_PAGE_CLEAN: &str = r#"export default function AboutPage() {
  const values = [
    { icon: '👔', title: 'Experienced Leadership', description: 'Proven track record in technology and innovation' },
    { icon: '🤖', title: 'AI Councils', description: 'Many minds, one debate' },
  ];

  return (
    <main>
      <p>Janus Forge Nexus is an innovative platform where multiple AI personalities debate in real time.</p>
      <span className="badge">⚡ Cutting-Edge Technology</span>
      <footer>
        <div className="text-gray-400 mt-2">Innovation Driven</div>
      </footer>
    </main>
  );
}
"#;

const HOME_PAGE: &str = r#"export default function Home() {
  const features = [
    { title: 'Ethical AI', description: 'Veteran-owned with human oversight' },
  ];
  const stats = [
    { value: '100%', label: 'Veteran Owned', color: 'text-orange-400' },
    { value: '7', label: 'AI Seats', color: 'text-blue-400' },
  ];

  return (
    <section>
      <h1>Janus Forge</h1>

      {/* Veteran Badge */}
      <div className="inline-flex items-center">
        <span>Veteran Owned</span>
      </div>
      <p>Where AI minds debate.</p>
    </section>
  );
}
"#;

const HOME_PAGE_CLEAN: &str = r#"export default function Home() {
  const features = [
    { title: 'Ethical AI', description: 'Human oversight and ethical principles' },
  ];
  const stats = [
    { value: '24/7', label: 'Live Support', color: 'text-orange-400' },
    { value: '7', label: 'AI Seats', color: 'text-blue-400' },
  ];

  return (
    <section>
      <h1>Janus Forge</h1>
      <p>Where AI minds debate.</p>
    </section>
  );
}
"#;

const PRICING_PAGE: &str = r#"export default function Pricing() {
  return (
    <div>
      <p>All plans include veteran-owned operation and ethical AI principles.</p>
      <Faq
        items={[
                {
                  q: 'Is this veteran-owned?',
                  a: 'Yes, Janus Forge Nexus is proudly veteran owned and operated by US Navy & Marine Veteran Cassandra Williamson.',
                },
        ]}
      />
    </div>
  );
}
"#;

const PRICING_PAGE_CLEAN: &str = r#"export default function Pricing() {
  return (
    <div>
      <p>All plans include ethical AI principles and human oversight.</p>
      <Faq
        items={[
                {
                  q: 'Who operates Janus Forge?',
                  a: 'Janus Forge Nexus is operated by a team of AI experts and ethicists committed to responsible AI development.',
                },
        ]}
      />
    </div>
  );
}
"#;

fn setup_mock_site() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::create_dir_all(dir.path().join("src/app/about")).unwrap();
    fs::create_dir_all(dir.path().join("src/app/pricing")).unwrap();

    fs::write(dir.path().join("src/app/about/page.tsx"), ABOUT_PAGE).unwrap();
    fs::write(dir.path().join("src/app/page.tsx"), HOME_PAGE).unwrap();
    fs::write(dir.path().join("src/app/pricing/page.tsx"), PRICING_PAGE).unwrap();

    dir
}

fn assert_preset_cleans(preset_name: &str, page: &str, expected: &str) {
    let site = setup_mock_site();
    let preset = find_preset(preset_name).unwrap();

    let report = preset.run(site.path(), RunMode::Write).unwrap();
    assert_eq!(report.status, PatchStatus::Patched, "{preset_name}");
    assert!(
        report.rules.iter().all(|rule| rule.replacements == 1),
        "{preset_name}: every rule should fire exactly once: {:?}",
        report.rules
    );

    let cleaned = fs::read_to_string(site.path().join(page)).unwrap();
    assert_eq!(cleaned, expected);
}

#[test]
fn test_about_preset() {
    assert_preset_cleans("clean-about-page", "src/app/about/page.tsx", ABOUT_PAGE_CLEAN);
}

#[test]
fn test_home_preset() {
    assert_preset_cleans("clean-home-page", "src/app/page.tsx", HOME_PAGE_CLEAN);
}

#[test]
fn test_pricing_preset() {
    assert_preset_cleans(
        "clean-pricing-page",
        "src/app/pricing/page.tsx",
        PRICING_PAGE_CLEAN,
    );
}

#[test]
fn test_presets_only_touch_their_own_page() {
    let site = setup_mock_site();
    let preset = find_preset("clean-pricing-page").unwrap();
    let _ = preset.run(site.path(), RunMode::Write).unwrap();

    assert_eq!(
        fs::read_to_string(site.path().join("src/app/about/page.tsx")).unwrap(),
        ABOUT_PAGE
    );
    assert_eq!(
        fs::read_to_string(site.path().join("src/app/page.tsx")).unwrap(),
        HOME_PAGE
    );
}

#[test]
fn test_presets_are_idempotent() {
    let site = setup_mock_site();

    for preset in PRESETS {
        let config = preset.config().unwrap();
        assert!(matches!(
            check_patch_set(&config, site.path()).unwrap(),
            CheckStatus::Pending { .. }
        ));

        let _ = preset.run(site.path(), RunMode::Write).unwrap();
        let again = preset.run(site.path(), RunMode::Write).unwrap();
        assert_eq!(again.status, PatchStatus::Unchanged, "{}", preset.name);
        assert_eq!(
            check_patch_set(&config, site.path()).unwrap(),
            CheckStatus::Applied,
            "{}",
            preset.name
        );
    }
}

#[test]
fn test_preset_dry_run_writes_nothing() {
    let site = setup_mock_site();
    let preset = find_preset("clean-about-page").unwrap();

    let report = preset.run(site.path(), RunMode::DryRun).unwrap();

    assert_eq!(report.status, PatchStatus::Patched);
    assert_eq!(report.after, ABOUT_PAGE_CLEAN);
    assert_eq!(
        fs::read_to_string(site.path().join("src/app/about/page.tsx")).unwrap(),
        ABOUT_PAGE
    );
}
