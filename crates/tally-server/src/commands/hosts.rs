use tally_config::TallyConfig;

pub fn handle(config: &TallyConfig) -> anyhow::Result<()> {
    for host in tally_server::bootstrap::candidate_hosts(&config.database) {
        println!("{host}");
    }
    Ok(())
}
