/// Prints the host topology the measurements were taken on, so the numbers
/// in a saved chart can be traced back to a machine shape.
pub fn write_cpu_info() {
    let logical = num_cpus::get();
    let physical = num_cpus::get_physical();

    println!("Logical Processor Count = {}", logical);
    println!("Physical Core Count = {}", physical);
    if logical > physical {
        println!("SMT = yes ({} threads per core)", logical / physical.max(1));
    } else {
        println!("SMT = no");
    }
}

pub fn get_num_cpus() -> usize {
    num_cpus::get()
}
