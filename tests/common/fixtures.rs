//! Portal page fixtures

/// Login page advertising the two root folders
pub fn login_page(public: &str, personal: &str) -> String {
    format!(
        r#"<html><head><script type="text/javascript">
var g_PS_PFRootId = "{public}";
var g_PS_MFRootId = "{personal}";
</script></head><body>Welcome</body></html>"#
    )
}

/// Folder page listing the given (name, href) anchors
pub fn listing_page(entries: &[(&str, String)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(name, href)| {
            format!(
                "<tr><td class=\"tableText\"><a href=\"{}\">{}</a></td></tr>\n",
                href.replace('&', "&amp;"),
                name
            )
        })
        .collect();
    format!("<html><body><table>\n{rows}</table></body></html>")
}

/// Listing href for a folder
pub fn folder_href(id: &str) -> String {
    format!("/ibmcognos/cgi-bin/cognos.cgi?b_action=xts.run&m=portal/cc.xts&m_folder={id}")
}

/// Listing href for a report
pub fn report_href(id: &str) -> String {
    format!(
        "/ibmcognos/cgi-bin/cognos.cgi?b_action=cognosViewer&ui.action=run&ui.object={id}&ui.name=x"
    )
}

fn viewer_state(status: &str, conversation: &str) -> String {
    format!(
        r#""m_sStatus": "{status}",
    "b_action": "cognosViewer",
    "m_sActionState": "AS-{conversation}",
    "cv.id": "_NS_",
    "cv.objectPermissions": "execute read",
    "m_sParameters": "<params/>",
    "m_sTracking": "TRK-{conversation}",
    "m_sCAFContext": "CAF-1",
    "m_sConversation": "{conversation}",
    "ui.object": "iREPORT",
    "ui.objectClass": "report",
    "ui.primaryAction": "run""#
    )
}

/// Viewer page for a run that is still working, plain JSON encoding
pub fn working_page(conversation: &str) -> String {
    format!(
        "<html><script>var oCV = {{\n    {}\n}};</script></html>",
        viewer_state("working", conversation)
    )
}

/// Viewer page for a run that is still working, HTML-escaped encoding
pub fn escaped_working_page(conversation: &str) -> String {
    let state = viewer_state("stillWorking", conversation).replace('"', "&quot;");
    format!("<html><input type=\"hidden\" value=\"{{{state}}}\"/></html>")
}

/// Viewer page for a report waiting on prompt values
pub fn prompting_page() -> String {
    format!(
        "<html><script>var oCV = {{\n    {}\n}};</script></html>",
        viewer_state("prompting", "P")
    )
}

/// Viewer page for a finished run
pub fn ready_page(download_url: &str) -> String {
    format!(
        "<html><script>\nvar sURL = '{download_url}';\nwindow.location = sURL;\n</script></html>"
    )
}

/// CSV produced by the mock portal
pub const SAMPLE_CSV: &str = "Student ID,Name,Grade\n1001,Ada Lovelace,12\n1002,Alan Turing,11\n";

fn utf16le(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

/// NTLM challenge (type 2) message from a server in domain `PORTAL`
pub fn ntlm_challenge() -> Vec<u8> {
    const HEADER_LEN: u32 = 56;
    // UNICODE | REQUEST_TARGET | NTLM | TARGET_TYPE_DOMAIN | TARGET_INFO | VERSION
    const FLAGS: u32 = 0x0000_0001 | 0x0000_0004 | 0x0000_0200 | 0x0001_0000 | 0x0080_0000 | 0x0200_0000;

    let target_name = utf16le("PORTAL");
    let mut target_info = Vec::new();
    // MsvAvNbDomainName
    target_info.extend_from_slice(&2u16.to_le_bytes());
    target_info.extend_from_slice(&(target_name.len() as u16).to_le_bytes());
    target_info.extend_from_slice(&target_name);
    // MsvAvEOL
    target_info.extend_from_slice(&[0, 0, 0, 0]);

    let name_offset = HEADER_LEN;
    let info_offset = HEADER_LEN + target_name.len() as u32;

    let mut message = Vec::new();
    message.extend_from_slice(b"NTLMSSP\0");
    message.extend_from_slice(&2u32.to_le_bytes());
    message.extend_from_slice(&(target_name.len() as u16).to_le_bytes());
    message.extend_from_slice(&(target_name.len() as u16).to_le_bytes());
    message.extend_from_slice(&name_offset.to_le_bytes());
    message.extend_from_slice(&FLAGS.to_le_bytes());
    message.extend_from_slice(&[0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef]);
    message.extend_from_slice(&[0; 8]);
    message.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    message.extend_from_slice(&(target_info.len() as u16).to_le_bytes());
    message.extend_from_slice(&info_offset.to_le_bytes());
    // Version 6.1 build 7601, NTLM revision 15
    message.extend_from_slice(&[6, 1, 0xb1, 0x1d, 0, 0, 0, 15]);
    message.extend_from_slice(&target_name);
    message.extend_from_slice(&target_info);
    message
}
