// Copyright 2022 Chris Gubbin
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use super::{AppError, Configuration};
use crate::{
    batch::{solve_batch, MatrixGenerator},
    context::SolverContext,
    device::Device,
    error::ErrorCategory,
    hamiltonian::HamiltonianBuilder,
    transmission::{Lead, TransportDirection, TwoLeadTransportSolverBuilder},
};
use console::Term;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;

/// Steps of the progress bar, independent of the number of energies
const PROGRESS_RESOLUTION: u64 = 1000;

/// The transmission at one energy, or the category of the failure there
#[derive(Clone, Debug, PartialEq)]
pub struct TransmissionPoint {
    /// Real part of the energy
    pub energy: f64,
    /// The transmission coefficient
    pub transmission: Result<f64, ErrorCategory>,
}

/// Solves the two-lead transport problem of `device` at every energy of the configured grid
pub fn transmission_spectrum(
    config: &Configuration,
    device: &Device,
    direction: TransportDirection,
) -> Result<Vec<TransmissionPoint>, AppError> {
    let hamiltonian = HamiltonianBuilder::new().with_device(device).build();
    let energies = config.spectral.energy_space()?;
    let broadening = energies.broadening();
    let settings = config.solver_settings();

    let partition = hamiltonian.partition()?;
    let coupling = hamiltonian.contact_coupling();

    let term = Term::stderr();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{prefix:.bold.dim} {spinner} {msg} [{wide_bar:.cyan/blue}] {percent}% ({eta})");
    let pb = ProgressBar::with_draw_target(PROGRESS_RESOLUTION, ProgressDrawTarget::term(term, 60));
    pb.set_style(spinner_style);
    pb.set_message(format!("{} energies", energies.number_of_points()));
    let sink = |fraction: f64| pb.set_position((fraction * PROGRESS_RESOLUTION as f64) as u64);
    let context = SolverContext::new().with_progress(&sink);

    let source = MatrixGenerator::new(energies.number_of_points(), |index| {
        hamiltonian.device_inverse(energies.energy_at(index), broadening)
    });
    let results = solve_batch(&source, context, |index, matrix| {
        let [left_cell, right_cell] = hamiltonian.lead_inverses(energies.energy_at(index), broadening);
        let mut solver = TwoLeadTransportSolverBuilder::new()
            .with_device(matrix, &partition)
            .with_left_lead(Lead {
                onsite: &left_cell,
                coupling: &coupling,
                device_coupling: &coupling,
            })
            .with_right_lead(Lead {
                onsite: &right_cell,
                coupling: &coupling,
                device_coupling: &coupling,
            })
            .with_chain_settings(settings.chain)
            .with_inversion_settings(settings.inversion)
            .with_transport_settings(settings.transport)
            .build()?
            .with_context(context.without_progress());
        solver.transmission(direction)
    });
    pb.finish_with_message("done");

    let spectrum = energies
        .points()
        .zip(results)
        .map(|(&energy, result)| TransmissionPoint {
            energy,
            transmission: result.map_err(|error| error.category()),
        })
        .collect::<Vec<_>>();

    let failures = spectrum
        .iter()
        .filter(|point| point.transmission.is_err())
        .count();
    if failures > 0 {
        tracing::warn!("{} of {} energies failed", failures, spectrum.len());
    }
    Ok(spectrum)
}

/// Writes `energy,transmission` rows, failed rows carry the failure category
pub fn write_spectrum<W: Write>(mut writer: W, spectrum: &[TransmissionPoint]) -> Result<(), AppError> {
    writeln!(writer, "energy,transmission")?;
    for point in spectrum {
        match &point.transmission {
            Ok(transmission) => writeln!(writer, "{:.10e},{:.10e}", point.energy, transmission)?,
            Err(category) => writeln!(writer, "{:.10e},{}", point.energy, category)?,
        }
    }
    writer.flush()?;
    Ok(())
}
