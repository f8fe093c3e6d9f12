//! # Admin menu
//!
//! Builds the administration navigation tree for one viewer. Groups and links
//! are shown to host admins unconditionally and to everybody else according
//! to their admin page access list. The output is plain data; turning it into
//! markup is up to the front end, and labels are resource keys, not text.

use domains::ForumPage;
use domains::ForumPage as P;
use serde::Serialize;

use crate::links::LinkBuilder;

const MENU_TEXT_PAGE: &str = "ADMINMENU";

/// Admin pages that only belong to the host's own menu; the board admin
/// dropdown is not highlighted while one of them is open.
const HOST_PAGES: &[ForumPage] = &[
    P::AdminHostSettings,
    P::AdminBoards,
    P::AdminEditBoard,
    P::AdminPageAccessEdit,
    P::AdminPageAccessList,
];

/// Localization resource key of a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextKey {
    pub page: &'static str,
    pub tag: &'static str,
}

impl TextKey {
    const fn menu(tag: &'static str) -> Self {
        Self {
            page: MENU_TEXT_PAGE,
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuLink {
    pub label: TextKey,
    pub url: String,
    pub icon: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuEntry {
    Link(MenuLink),
    Dropdown {
        label: TextKey,
        icon: &'static str,
        active: bool,
        children: Vec<MenuLink>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminMenu {
    /// Whether the admin dropdown itself is highlighted.
    pub active: bool,
    pub entries: Vec<MenuEntry>,
}

impl AdminMenu {
    pub fn dropdown(&self, tag: &str) -> Option<&[MenuLink]> {
        self.entries.iter().find_map(|entry| match entry {
            MenuEntry::Dropdown { label, children, .. } if label.tag == tag => {
                Some(children.as_slice())
            }
            _ => None,
        })
    }
}

enum Target {
    Page(ForumPage),
    Installer,
}

struct ItemSpec {
    target: Target,
    label: TextKey,
    icon: &'static str,
    active_on: &'static [ForumPage],
    host_only: bool,
}

const fn link(
    page: ForumPage,
    tag: &'static str,
    icon: &'static str,
    active_on: &'static [ForumPage],
) -> ItemSpec {
    ItemSpec {
        target: Target::Page(page),
        label: TextKey::menu(tag),
        icon,
        active_on,
        host_only: false,
    }
}

struct GroupSpec {
    label: TextKey,
    icon: &'static str,
    /// Access to any of these pages makes the group visible.
    gate: &'static [ForumPage],
    active_on: &'static [ForumPage],
    items: &'static [ItemSpec],
}

const DASHBOARD: ItemSpec = link(P::AdminAdmin, "ADMIN_ADMIN", "tachometer-alt", &[P::AdminAdmin]);

const GROUPS: &[GroupSpec] = &[
    GroupSpec {
        label: TextKey::menu("SETTINGS"),
        icon: "cogs",
        gate: &[
            P::AdminBoardAnnouncement,
            P::AdminSettings,
            P::AdminForums,
            P::AdminReplaceWords,
            P::AdminBbCodes,
            P::AdminLanguages,
        ],
        active_on: &[
            P::AdminBoardAnnouncement,
            P::AdminSettings,
            P::AdminForums,
            P::AdminEditForum,
            P::AdminEditCategory,
            P::AdminReplaceWords,
            P::AdminBbCodes,
            P::AdminBbCodeEdit,
            P::AdminLanguages,
            P::AdminEditLanguage,
        ],
        items: &[
            link(P::AdminBoardAnnouncement, "admin_BoardAnnouncement", "bullhorn", &[P::AdminBoardAnnouncement]),
            link(P::AdminSettings, "admin_boardsettings", "cogs", &[P::AdminSettings]),
            link(
                P::AdminForums,
                "admin_forums",
                "comments",
                &[P::AdminForums, P::AdminEditForum, P::AdminEditCategory],
            ),
            link(P::AdminReplaceWords, "admin_replacewords", "sticky-note", &[P::AdminReplaceWords]),
            link(P::AdminBbCodes, "admin_bbcode", "plug", &[P::AdminBbCodes, P::AdminBbCodeEdit]),
            link(P::AdminLanguages, "admin_Languages", "language", &[P::AdminLanguages, P::AdminEditLanguage]),
        ],
    },
    GroupSpec {
        label: TextKey::menu("Spam_Protection"),
        icon: "shield-alt",
        gate: &[
            P::AdminSpamLog,
            P::AdminSpamWords,
            P::AdminBannedEmails,
            P::AdminBannedIps,
            P::AdminBannedNames,
        ],
        active_on: &[
            P::AdminSpamLog,
            P::AdminSpamWords,
            P::AdminBannedEmails,
            P::AdminBannedIps,
            P::AdminBannedNames,
        ],
        items: &[
            link(P::AdminSpamLog, "admin_spamlog", "book", &[P::AdminSpamLog]),
            link(P::AdminSpamWords, "admin_SpamWords", "hand-paper", &[P::AdminSpamWords]),
            link(P::AdminBannedEmails, "admin_BannedEmail", "hand-paper", &[P::AdminBannedEmails]),
            link(P::AdminBannedIps, "admin_BannedIp", "hand-paper", &[P::AdminBannedIps]),
            link(P::AdminBannedNames, "admin_BannedName", "hand-paper", &[P::AdminBannedNames]),
        ],
    },
    GroupSpec {
        label: TextKey::menu("UsersandRoles"),
        icon: "users",
        gate: &[
            P::AdminProfileDefinitions,
            P::AdminAccessMasks,
            P::AdminGroups,
            P::AdminRanks,
            P::AdminUsers,
            P::AdminMedals,
            P::AdminMail,
            P::AdminDigest,
        ],
        active_on: &[
            P::AdminProfileDefinitions,
            P::AdminAccessMasks,
            P::AdminEditAccessMask,
            P::AdminGroups,
            P::AdminEditGroup,
            P::AdminRanks,
            P::AdminUsers,
            P::AdminEditUser,
            P::AdminEditRank,
            P::AdminMedals,
            P::AdminEditMedal,
            P::AdminMail,
            P::AdminDigest,
        ],
        items: &[
            link(P::AdminProfileDefinitions, "admin_ProfileDefinitions", "id-card", &[P::AdminProfileDefinitions]),
            link(
                P::AdminAccessMasks,
                "admin_AccessMasks",
                "universal-access",
                &[P::AdminAccessMasks, P::AdminEditAccessMask],
            ),
            link(P::AdminGroups, "admin_Groups", "users", &[P::AdminGroups, P::AdminEditGroup]),
            link(P::AdminUsers, "admin_Users", "users", &[P::AdminUsers, P::AdminEditUser]),
            link(P::AdminRanks, "admin_Ranks", "graduation-cap", &[P::AdminRanks, P::AdminEditRank]),
            link(P::AdminMedals, "admin_Medals", "medal", &[P::AdminMedals, P::AdminEditMedal]),
            link(P::AdminMail, "admin_Mail", "at", &[P::AdminMail]),
            link(P::AdminDigest, "admin_Digest", "envelope", &[P::AdminDigest]),
        ],
    },
    // Private message maintenance has a link but does not open the group by itself.
    GroupSpec {
        label: TextKey::menu("Maintenance"),
        icon: "toolbox",
        gate: &[
            P::AdminPrune,
            P::AdminRestore,
            P::AdminTaskManager,
            P::AdminEventLog,
            P::AdminRestartApp,
        ],
        active_on: &[
            P::AdminPrune,
            P::AdminRestore,
            P::AdminTaskManager,
            P::AdminEventLog,
            P::AdminRestartApp,
        ],
        items: &[
            link(P::AdminPrune, "admin_Prune", "trash", &[P::AdminPrune]),
            link(P::AdminRestore, "admin_Restore", "trash-restore", &[P::AdminRestore]),
            link(P::AdminPm, "admin_Pm", "envelope-square", &[P::AdminPm]),
            link(P::AdminTaskManager, "admin_TaskManager", "tasks", &[P::AdminTaskManager]),
            link(P::AdminEventLog, "admin_EventLog", "book", &[P::AdminEventLog]),
            link(P::AdminRestartApp, "admin_RestartApp", "sync", &[P::AdminRestartApp]),
        ],
    },
    GroupSpec {
        label: TextKey::menu("Database"),
        icon: "database",
        gate: &[P::AdminReIndex, P::AdminRunSql],
        active_on: &[P::AdminReIndex, P::AdminRunSql],
        items: &[
            link(P::AdminReIndex, "admin_ReIndex", "database", &[P::AdminReIndex]),
            link(P::AdminRunSql, "admin_RunSql", "database", &[P::AdminRunSql]),
        ],
    },
    GroupSpec {
        label: TextKey::menu("NNTP"),
        icon: "newspaper",
        gate: &[P::AdminNntpRetrieve, P::AdminNntpForums, P::AdminNntpServers],
        active_on: &[P::AdminNntpRetrieve, P::AdminNntpForums, P::AdminNntpServers],
        items: &[
            link(P::AdminNntpServers, "admin_NntpServers", "newspaper", &[P::AdminNntpServers]),
            link(P::AdminNntpForums, "admin_NntpForums", "newspaper", &[P::AdminNntpForums]),
            link(P::AdminNntpRetrieve, "admin_NntpRetrieve", "newspaper", &[P::AdminNntpRetrieve]),
        ],
    },
    GroupSpec {
        label: TextKey::menu("Upgrade"),
        icon: "download",
        gate: &[P::AdminVersion],
        active_on: &[P::AdminVersion],
        items: &[
            link(P::AdminVersion, "admin_Version", "info", &[P::AdminVersion]),
            ItemSpec {
                target: Target::Installer,
                label: TextKey::menu("Upgrade"),
                icon: "download",
                active_on: &[],
                host_only: true,
            },
        ],
    },
];

/// True if the viewer should see the admin menu at all.
pub fn has_admin_access(is_host_admin: bool, access: &[ForumPage]) -> bool {
    is_host_admin || access.iter().any(|page| page.is_admin_page())
}

pub struct AdminMenuBuilder<'a> {
    links: &'a LinkBuilder,
}

impl<'a> AdminMenuBuilder<'a> {
    pub fn new(links: &'a LinkBuilder) -> Self {
        Self { links }
    }

    /// Menu for a viewer currently on `current`.
    ///
    /// `access` is ignored for host admins, who see every entry.
    pub fn build(&self, current: ForumPage, is_host_admin: bool, access: &[ForumPage]) -> AdminMenu {
        let allowed = |page: &ForumPage| is_host_admin || access.contains(page);

        let mut entries = vec![MenuEntry::Link(self.render(&DASHBOARD, current))];

        for group in GROUPS {
            if !group.gate.iter().any(allowed) {
                continue;
            }

            let children = group
                .items
                .iter()
                .filter(|item| match item.target {
                    _ if item.host_only => is_host_admin,
                    Target::Page(page) => allowed(&page),
                    Target::Installer => is_host_admin,
                })
                .map(|item| self.render(item, current))
                .collect();

            entries.push(MenuEntry::Dropdown {
                label: group.label,
                icon: group.icon,
                active: group.active_on.contains(&current),
                children,
            });
        }

        AdminMenu {
            active: current.is_admin_page() && !HOST_PAGES.contains(&current),
            entries,
        }
    }

    fn render(&self, item: &ItemSpec, current: ForumPage) -> MenuLink {
        let url = match item.target {
            Target::Page(page) => self.links.page(page),
            Target::Installer => self.links.installer(),
        };

        MenuLink {
            label: item.label,
            url,
            icon: item.icon,
            active: item.active_on.contains(&current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(links: &[MenuLink]) -> Vec<&'static str> {
        links.iter().map(|link| link.label.tag).collect()
    }

    #[test]
    fn host_admin_sees_everything() {
        let links = LinkBuilder::default();
        let menu = AdminMenuBuilder::new(&links).build(P::AdminAdmin, true, &[]);

        assert!(menu.active);
        assert_eq!(menu.entries.len(), 1 + GROUPS.len());
        assert!(matches!(&menu.entries[0], MenuEntry::Link(dashboard) if dashboard.active && dashboard.url == "/admin"));

        let upgrade = menu.dropdown("Upgrade").unwrap();
        assert_eq!(tags(upgrade), vec!["admin_Version", "Upgrade"]);
        assert_eq!(upgrade[1].url, "/install");
        assert!(!upgrade[1].active);

        let maintenance = menu.dropdown("Maintenance").unwrap();
        assert!(tags(maintenance).contains(&"admin_Pm"));
    }

    #[test]
    fn limited_admin_sees_granted_pages_only() {
        let links = LinkBuilder::new("/forum");
        let menu = AdminMenuBuilder::new(&links).build(P::AdminEditForum, false, &[P::AdminForums]);

        assert_eq!(menu.entries.len(), 2);
        match &menu.entries[1] {
            MenuEntry::Dropdown { label, active, children, .. } => {
                assert_eq!(label.tag, "SETTINGS");
                assert!(*active);
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].url, "/forum/admin/forums");
                assert!(children[0].active);
            }
            other => panic!("expected settings dropdown, got {other:?}"),
        }
        assert!(menu.dropdown("Database").is_none());
    }

    #[test]
    fn installer_link_is_host_only() {
        let links = LinkBuilder::default();
        let menu = AdminMenuBuilder::new(&links).build(P::AdminVersion, false, &[P::AdminVersion]);

        let upgrade = menu.dropdown("Upgrade").unwrap();
        assert_eq!(tags(upgrade), vec!["admin_Version"]);
        assert!(upgrade[0].active);
    }

    #[test]
    fn pm_access_alone_does_not_open_maintenance() {
        let links = LinkBuilder::default();
        let menu = AdminMenuBuilder::new(&links).build(P::AdminPm, false, &[P::AdminPm]);
        assert!(menu.dropdown("Maintenance").is_none());

        let menu = AdminMenuBuilder::new(&links).build(P::AdminPm, false, &[P::AdminPm, P::AdminPrune]);
        let maintenance = menu.dropdown("Maintenance").unwrap();
        assert_eq!(tags(maintenance), vec!["admin_Prune", "admin_Pm"]);
    }

    #[test]
    fn host_pages_and_public_pages_do_not_highlight() {
        let links = LinkBuilder::default();
        let builder = AdminMenuBuilder::new(&links);
        assert!(!builder.build(P::AdminBoards, true, &[]).active);
        assert!(!builder.build(P::Topics, true, &[]).active);
        assert!(builder.build(P::AdminUsers, true, &[]).active);
    }

    #[test]
    fn admin_access_check() {
        assert!(has_admin_access(true, &[]));
        assert!(has_admin_access(false, &[P::AdminMail]));
        assert!(!has_admin_access(false, &[]));
    }
}
